//! HTTP chat backend.
//!
//! Exposes the conversational pipeline over REST: `POST /chat`,
//! `POST /clear_history` and a `GET /` health check. Initialization (vector
//! store open, model handles) runs in a background task; requests that
//! arrive before it finishes get a 503 instead of hanging.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::ChatOrchestrator;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

/// Lifecycle of the chat service.
pub enum ServiceState {
    /// Initialization still running; chats are rejected, not queued.
    Starting,
    /// Pipeline ready to serve requests.
    Ready(Arc<ChatOrchestrator>),
    /// Initialization failed; the message is logged, never sent to clients.
    Failed(String),
}

/// Shared application state.
pub struct AppState {
    service: RwLock<ServiceState>,
}

impl AppState {
    /// State for a service whose initialization is still in flight.
    pub fn starting() -> Arc<Self> {
        Arc::new(Self {
            service: RwLock::new(ServiceState::Starting),
        })
    }

    /// State wrapping an already-initialized orchestrator.
    pub fn ready(orchestrator: Arc<ChatOrchestrator>) -> Arc<Self> {
        Arc::new(Self {
            service: RwLock::new(ServiceState::Ready(orchestrator)),
        })
    }

    /// State for a service that failed to initialize.
    pub fn failed(reason: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            service: RwLock::new(ServiceState::Failed(reason.into())),
        })
    }

    async fn set(&self, state: ServiceState) {
        *self.service.write().await = state;
    }

    /// The orchestrator, if the service is ready.
    async fn orchestrator(&self) -> Option<Arc<ChatOrchestrator>> {
        match &*self.service.read().await {
            ServiceState::Ready(orchestrator) => Some(orchestrator.clone()),
            ServiceState::Starting => None,
            ServiceState::Failed(reason) => {
                warn!("Request rejected, service failed to initialize: {}", reason);
                None
            }
        }
    }
}

/// Run the HTTP chat backend.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let state = AppState::starting();

    // Vector store open and model handle setup happen off the request path;
    // requests issued meanwhile fail fast with 503.
    let init_state = state.clone();
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || ChatOrchestrator::new(settings)).await;
        match result {
            Ok(Ok(orchestrator)) => {
                info!("Chat pipeline initialized");
                init_state
                    .set(ServiceState::Ready(Arc::new(orchestrator)))
                    .await;
            }
            Ok(Err(e)) => {
                error!("Initialization failed: {}", e);
                init_state.set(ServiceState::Failed(e.to_string())).await;
            }
            Err(e) => {
                error!("Initialization task panicked: {}", e);
                init_state.set(ServiceState::Failed(e.to_string())).await;
            }
        }
    });

    let app = app_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Aula Chat Backend");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /");
    Output::kv("Chat", "POST /chat");
    Output::kv("Clear History", "POST /clear_history");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Separate from `run_serve` so tests can drive it directly.
pub fn app_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .route("/clear_history", post(clear_history))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    session_id: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct ClearHistoryRequest {
    session_id: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn not_ready_response() -> axum::response::Response {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "The chat service is not ready. Please try again shortly.",
    )
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Aula chatbot backend is running."
    }))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> impl IntoResponse {
    if req.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "message must not be empty");
    }
    if req.session_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "session_id must not be empty");
    }

    let Some(orchestrator) = state.orchestrator().await else {
        return not_ready_response();
    };

    match orchestrator.chat(&req.session_id, &req.message).await {
        Ok(answer) => Json(ChatResponse { response: answer }).into_response(),
        Err(crate::error::AulaError::InvalidInput(msg)) => {
            error_response(StatusCode::BAD_REQUEST, &msg)
        }
        Err(e) => {
            // Full detail stays server-side; clients get a generic message.
            error!("Chat request failed: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred while processing your request.",
            )
        }
    }
}

async fn clear_history(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClearHistoryRequest>,
) -> impl IntoResponse {
    if req.session_id.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "session_id must not be empty");
    }

    let Some(orchestrator) = state.orchestrator().await else {
        return not_ready_response();
    };

    let status = if orchestrator.clear_session(&req.session_id) {
        "History cleared."
    } else {
        "No history to clear."
    };

    Json(StatusResponse {
        status: status.to_string(),
    })
    .into_response()
}
