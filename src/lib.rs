//! Aula - A RAG chatbot backend for university information sites.
//!
//! Documents (prospectus chunks, course pages, notices) are ingested into a
//! vector store; a chat endpoint answers user questions by retrieving the
//! most relevant passages and conditioning a language-model completion on
//! them, while keeping per-session conversation history.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `embedding` - Embedding generation
//! - `llm` - Chat completion abstraction
//! - `vector_store` - Vector database abstraction
//! - `retriever` - Query-time top-k retrieval
//! - `history` - Per-session chat history
//! - `rag` - Question contextualization and grounded answer generation
//! - `orchestrator` - Per-request pipeline coordination
//! - `cli` - Command-line interface and the HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use aula::config::Settings;
//! use aula::orchestrator::ChatOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = ChatOrchestrator::new(settings)?;
//!
//!     let answer = orchestrator.chat("session-1", "When do admissions open?").await?;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod history;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod retriever;
pub mod vector_store;

pub use error::{AulaError, Result};
