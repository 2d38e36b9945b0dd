//! Conversational RAG building blocks.
//!
//! `contextualize` turns a raw user message plus history into a standalone
//! retrieval query; `answer` grounds a completion call on the retrieved
//! chunks.

pub mod answer;
pub mod contextualize;

pub use answer::AnswerGenerator;
pub use contextualize::{decide, Contextualizer, RewriteDecision};

use crate::history::Turn;

/// The most recent `window` turns of a history.
pub(crate) fn recent_turns(history: &[Turn], window: usize) -> &[Turn] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}
