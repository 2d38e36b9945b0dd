//! Configuration module for Aula.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, ContextualizePrompts, Prompts};
pub use settings::{
    ChatSettings, EmbeddingSettings, GeneralSettings, PromptSettings, RetrievalSettings,
    ServerSettings, Settings, VectorStoreSettings,
};
