//! Grounded answer generation.
//!
//! The generator never errors out of the chat pipeline: zero retrieved
//! chunks yield the fixed no-information sentence, and a failed or empty
//! completion yields a static failure sentence. The caller always gets a
//! non-empty answer string.

use super::recent_turns;
use crate::config::Prompts;
use crate::history::{Role, Turn};
use crate::llm::ChatModel;
use crate::retriever::RetrievedDocument;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Delimiter between document chunks in the grounding context.
const CHUNK_DELIMITER: &str = "\n\n---\n\n";

/// Generates grounded answers from retrieved chunks.
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    history_window: usize,
}

impl AnswerGenerator {
    /// Create a new answer generator.
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts, history_window: usize) -> Self {
        Self {
            model,
            prompts,
            history_window,
        }
    }

    /// The sentence returned verbatim when nothing relevant was retrieved.
    pub fn no_context_answer(&self) -> &str {
        &self.prompts.answer.no_context
    }

    /// Generate an answer for a question given retrieved chunks and history.
    #[instrument(skip(self, docs, history), fields(question = %question, chunks = docs.len()))]
    pub async fn generate(
        &self,
        question: &str,
        docs: &[RetrievedDocument],
        history: &[Turn],
    ) -> String {
        if docs.is_empty() {
            debug!("No context retrieved, returning no-information answer");
            return self.prompts.answer.no_context.clone();
        }

        let context = docs
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join(CHUNK_DELIMITER);

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context);

        let user_prompt = self.prompts.render_with_custom(&self.prompts.answer.user, &vars);

        let mut turns: Vec<Turn> = recent_turns(history, self.history_window).to_vec();
        turns.push(Turn::new(Role::User, user_prompt));

        match self.model.complete(&self.prompts.answer_system(), &turns).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Answer completion returned empty text");
                self.prompts.answer.failure.clone()
            }
            Err(e) => {
                warn!("Answer completion failed: {}", e);
                self.prompts.answer.failure.clone()
            }
        }
    }
}
