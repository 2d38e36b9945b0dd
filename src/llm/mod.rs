//! Language-model completion abstraction.
//!
//! The chat pipeline talks to the model through the [`ChatModel`] trait so
//! the rewrite and answer steps can be exercised with test doubles.

mod openai;

pub use openai::OpenAIChatModel;

use crate::error::Result;
use crate::history::Turn;
use async_trait::async_trait;

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run a completion over a system prompt and an ordered turn sequence.
    /// Returns the assistant's text.
    async fn complete(&self, system: &str, turns: &[Turn]) -> Result<String>;
}
