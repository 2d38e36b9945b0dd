//! Conversation orchestration for Aula.
//!
//! Ties the session store, contextualizer, retriever and answer generator
//! together per request: snapshot history, rewrite the question, retrieve
//! context, generate a grounded answer, then commit the user/assistant turn
//! pair. History is only mutated after the full pipeline has produced an
//! answer, so a failed or cancelled request leaves no partial turn behind.

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{AulaError, Result};
use crate::history::SessionStore;
use crate::llm::{ChatModel, OpenAIChatModel};
use crate::rag::{AnswerGenerator, Contextualizer};
use crate::retriever::Retriever;
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The main chat pipeline.
pub struct ChatOrchestrator {
    sessions: Arc<SessionStore>,
    contextualizer: Contextualizer,
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl ChatOrchestrator {
    /// Build the orchestrator from settings.
    ///
    /// Opens the vector store and acquires model handles; any failure here is
    /// an initialization failure and the service must not accept chats.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let vector_store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            "sqlite" => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
            other => {
                return Err(AulaError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        // Rewrites are deterministic lookups, so temperature stays at zero
        // regardless of the answer temperature.
        let rewrite_model: Arc<dyn ChatModel> =
            Arc::new(OpenAIChatModel::new(settings.chat.rewrite_model(), 0.0));
        let answer_model: Arc<dyn ChatModel> = Arc::new(OpenAIChatModel::new(
            &settings.chat.model,
            settings.chat.temperature,
        ));

        let contextualizer = Contextualizer::new(
            rewrite_model,
            prompts.contextualize_system(),
            settings.chat.history_window,
        );
        let retriever =
            Retriever::new(vector_store, embedder).with_top_k(settings.retrieval.top_k);
        let generator =
            AnswerGenerator::new(answer_model, prompts, settings.chat.history_window);

        Ok(Self {
            sessions: Arc::new(SessionStore::new()),
            contextualizer,
            retriever,
            generator,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        sessions: Arc<SessionStore>,
        contextualizer: Contextualizer,
        retriever: Retriever,
        generator: AnswerGenerator,
    ) -> Self {
        Self {
            sessions,
            contextualizer,
            retriever,
            generator,
        }
    }

    /// Handle one chat request for a session.
    ///
    /// Retrieval errors degrade to an empty context and rewrite errors to the
    /// raw question; only invalid input surfaces as an error. The returned
    /// answer is always non-empty.
    #[instrument(skip(self, message), fields(session_id = %session_id))]
    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String> {
        let message = message.trim();
        if session_id.trim().is_empty() {
            return Err(AulaError::InvalidInput(
                "session_id must not be empty".to_string(),
            ));
        }
        if message.is_empty() {
            return Err(AulaError::InvalidInput(
                "message must not be empty".to_string(),
            ));
        }

        let history = self.sessions.get_or_create(session_id);

        let standalone = self.contextualizer.contextualize(&history, message).await;

        let docs = match self.retriever.retrieve(&standalone).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Retrieval failed, answering without context: {}", e);
                Vec::new()
            }
        };

        let answer = self.generator.generate(&standalone, &docs, &history).await;

        // Commit the turn pair only once the answer exists.
        self.sessions.append_exchange(session_id, message, &answer);

        info!(
            "Answered chat for session {} using {} context chunks",
            session_id,
            docs.len()
        );
        Ok(answer)
    }

    /// Drop a session's history. Returns whether anything existed.
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.clear(session_id)
    }

    /// Number of turns recorded for a session.
    pub fn history_len(&self, session_id: &str) -> usize {
        self.sessions.len(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::MockEmbedder;
    use crate::history::Role;
    use crate::llm::testing::MockChatModel;
    use crate::vector_store::Document;

    /// Orchestrator over mocks: seeded memory store, scripted models.
    async fn test_orchestrator(
        rewrite: Arc<MockChatModel>,
        answer: Arc<MockChatModel>,
        seed_docs: bool,
        embedder: Arc<MockEmbedder>,
    ) -> ChatOrchestrator {
        let store = Arc::new(MemoryVectorStore::new());
        if seed_docs {
            let seeder = MockEmbedder::new();
            for (i, content) in [
                "Admissions open in June",
                "Tuition is 50,000 per year",
                "Library is open 8am to 10pm",
            ]
            .iter()
            .enumerate()
            {
                let embedding = seeder.embed(content).await.unwrap();
                let doc = Document::new(
                    "prospectus".to_string(),
                    None,
                    content.to_string(),
                    embedding,
                    i as i32,
                );
                store.upsert(&doc).await.unwrap();
            }
        }

        let prompts = Prompts::default();
        ChatOrchestrator::with_components(
            Arc::new(SessionStore::new()),
            Contextualizer::new(rewrite, prompts.contextualize_system(), 10),
            Retriever::new(store, embedder).with_top_k(3),
            AnswerGenerator::new(answer, prompts, 10),
        )
    }

    #[tokio::test]
    async fn test_history_grows_by_pairs() {
        let orch = test_orchestrator(
            Arc::new(MockChatModel::replying("rewritten")),
            Arc::new(MockChatModel::replying("an answer")),
            true,
            Arc::new(MockEmbedder::new()),
        )
        .await;

        for i in 0..5 {
            let answer = orch
                .chat("s1", &format!("What is question number {} about?", i))
                .await
                .unwrap();
            assert_eq!(answer, "an answer");
            assert_eq!(orch.history_len("s1"), 2 * (i + 1));
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_without_touching_history() {
        let orch = test_orchestrator(
            Arc::new(MockChatModel::replying("rewritten")),
            Arc::new(MockChatModel::replying("an answer")),
            true,
            Arc::new(MockEmbedder::new()),
        )
        .await;

        assert!(matches!(
            orch.chat("s1", "   ").await,
            Err(AulaError::InvalidInput(_))
        ));
        assert!(matches!(
            orch.chat("", "What are the fees?").await,
            Err(AulaError::InvalidInput(_))
        ));
        assert_eq!(orch.history_len("s1"), 0);
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_to_no_context_answer() {
        let orch = test_orchestrator(
            Arc::new(MockChatModel::replying("rewritten")),
            Arc::new(MockChatModel::replying("SHOULD NOT APPEAR")),
            true,
            Arc::new(MockEmbedder::failing()),
        )
        .await;

        let answer = orch.chat("s1", "What are the hostel fees?").await.unwrap();
        assert_eq!(answer, Prompts::default().answer.no_context);
        // The degraded answer is still a committed turn pair
        assert_eq!(orch.history_len("s1"), 2);
    }

    #[tokio::test]
    async fn test_empty_index_yields_no_context_answer() {
        let orch = test_orchestrator(
            Arc::new(MockChatModel::replying("rewritten")),
            Arc::new(MockChatModel::replying("SHOULD NOT APPEAR")),
            false,
            Arc::new(MockEmbedder::new()),
        )
        .await;

        let answer = orch.chat("s1", "What are the hostel fees?").await.unwrap();
        assert_eq!(answer, Prompts::default().answer.no_context);
    }

    #[tokio::test]
    async fn test_generation_failure_still_returns_and_records_an_answer() {
        let orch = test_orchestrator(
            Arc::new(MockChatModel::replying("rewritten")),
            Arc::new(MockChatModel::failing("backend down")),
            true,
            Arc::new(MockEmbedder::new()),
        )
        .await;

        let answer = orch.chat("s1", "What are the admission dates?").await.unwrap();
        assert_eq!(answer, Prompts::default().answer.failure);
        assert_eq!(orch.history_len("s1"), 2);
    }

    #[tokio::test]
    async fn test_follow_up_uses_rewritten_question_for_generation() {
        let rewrite = Arc::new(MockChatModel::replying("What is the admission fee?"));
        let answer = Arc::new(MockChatModel::replying("It is 50,000 per year."));
        let orch =
            test_orchestrator(rewrite.clone(), answer.clone(), true, Arc::new(MockEmbedder::new()))
                .await;

        orch.chat("s1", "Tell me about the admission process please")
            .await
            .unwrap();
        orch.chat("s1", "and the fee?").await.unwrap();

        assert_eq!(rewrite.call_count(), 1);
        let prompt = answer.last_user_content().unwrap();
        assert!(prompt.contains("What is the admission fee?"));

        // History records what the user actually typed, not the rewrite
        let turns = orch.sessions.get_or_create("s1");
        assert_eq!(turns[2].content, "and the fee?");
        assert_eq!(turns[2].role, Role::User);
    }

    #[tokio::test]
    async fn test_concurrent_sessions_stay_isolated() {
        let orch = Arc::new(
            test_orchestrator(
                Arc::new(MockChatModel::replying("rewritten")),
                Arc::new(MockChatModel::replying("an answer")),
                true,
                Arc::new(MockEmbedder::new()),
            )
            .await,
        );

        let mut handles = Vec::new();
        for s in 0..8 {
            let orch = orch.clone();
            handles.push(tokio::spawn(async move {
                let session = format!("session-{}", s);
                for i in 0..5 {
                    orch.chat(&session, &format!("Question {} for session {}?", i, s))
                        .await
                        .unwrap();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        for s in 0..8 {
            assert_eq!(orch.history_len(&format!("session-{}", s)), 10);
        }
    }

    #[tokio::test]
    async fn test_clear_session_is_idempotent() {
        let orch = test_orchestrator(
            Arc::new(MockChatModel::replying("rewritten")),
            Arc::new(MockChatModel::replying("an answer")),
            true,
            Arc::new(MockEmbedder::new()),
        )
        .await;

        assert!(!orch.clear_session("missing"));
        orch.chat("s1", "What are the admission dates?").await.unwrap();
        assert!(orch.clear_session("s1"));
        assert!(!orch.clear_session("s1"));
        assert_eq!(orch.history_len("s1"), 0);
    }
}
