//! History-aware question rewriting.
//!
//! Follow-up messages like "and the fee?" only make sense next to the
//! preceding turns. Before retrieval they are rewritten into standalone
//! questions; self-contained questions pass through untouched and never cost
//! a model call.

use super::recent_turns;
use crate::history::{Role, Turn};
use crate::llm::ChatModel;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Questions shorter than this are treated as fragments.
const MIN_STANDALONE_WORDS: usize = 4;

/// Leading words that mark a message as continuing the previous topic.
const FOLLOW_UP_OPENERS: &[&str] = &[
    "and", "or", "but", "also", "then", "so", "it", "its", "they", "them", "their", "that",
    "this", "those", "these", "he", "she", "his", "her", "what about", "how about", "more",
    "again",
];

/// Whether a question is forwarded to the model for rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteDecision {
    /// The question stands on its own; use it verbatim.
    PassThrough,
    /// The question depends on prior turns; delegate the rewrite.
    DelegateToModel,
}

/// Decide whether a question needs history to be understood.
///
/// Deliberately conservative: only clearly fragmentary or pronoun-led
/// messages are delegated, so a well-formed question is never mangled by a
/// rewrite and the common case skips a completion round-trip.
pub fn decide(history: &[Turn], question: &str) -> RewriteDecision {
    if history.is_empty() {
        return RewriteDecision::PassThrough;
    }

    let words: Vec<&str> = question.split_whitespace().collect();
    if words.len() < MIN_STANDALONE_WORDS {
        return RewriteDecision::DelegateToModel;
    }

    let normalize = |w: &str| {
        w.trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase()
    };
    let first = normalize(words[0]);
    let first_two = format!("{} {}", first, normalize(words[1]));

    if FOLLOW_UP_OPENERS.contains(&first.as_str())
        || FOLLOW_UP_OPENERS.contains(&first_two.as_str())
    {
        return RewriteDecision::DelegateToModel;
    }

    RewriteDecision::PassThrough
}

/// Rewrites follow-up questions into standalone retrieval queries.
pub struct Contextualizer {
    model: Arc<dyn ChatModel>,
    system: String,
    history_window: usize,
}

impl Contextualizer {
    /// Create a contextualizer with the rendered system instruction.
    pub fn new(model: Arc<dyn ChatModel>, system: String, history_window: usize) -> Self {
        Self {
            model,
            system,
            history_window,
        }
    }

    /// Produce a standalone question for the latest user message.
    ///
    /// Never fails: when the rewrite call errors or returns nothing, the raw
    /// question is used so the pipeline keeps going.
    #[instrument(skip(self, history), fields(turns = history.len()))]
    pub async fn contextualize(&self, history: &[Turn], question: &str) -> String {
        match decide(history, question) {
            RewriteDecision::PassThrough => {
                debug!("Question passed through unchanged");
                question.to_string()
            }
            RewriteDecision::DelegateToModel => {
                let mut turns: Vec<Turn> =
                    recent_turns(history, self.history_window).to_vec();
                turns.push(Turn::new(Role::User, question));

                match self.model.complete(&self.system, &turns).await {
                    Ok(rewritten) if !rewritten.trim().is_empty() => {
                        let rewritten = rewritten.trim().to_string();
                        debug!("Rewrote question to: {}", rewritten);
                        rewritten
                    }
                    Ok(_) => {
                        warn!("Rewrite returned empty text, using raw question");
                        question.to_string()
                    }
                    Err(e) => {
                        warn!("Question rewrite failed, using raw question: {}", e);
                        question.to_string()
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::MockChatModel;

    fn admissions_history() -> Vec<Turn> {
        vec![
            Turn::new(Role::User, "Tell me about admissions"),
            Turn::new(
                Role::Assistant,
                "Admissions open in June; applications are submitted online.",
            ),
        ]
    }

    #[test]
    fn test_decide_empty_history_passes_through() {
        for q in ["and the fee?", "it?", "What is the library timing?"] {
            assert_eq!(decide(&[], q), RewriteDecision::PassThrough);
        }
    }

    #[test]
    fn test_decide_fragments_delegate() {
        let history = admissions_history();
        assert_eq!(decide(&history, "and the fee?"), RewriteDecision::DelegateToModel);
        assert_eq!(decide(&history, "what about hostel fees then?"), RewriteDecision::DelegateToModel);
        assert_eq!(decide(&history, "its duration?"), RewriteDecision::DelegateToModel);
    }

    #[test]
    fn test_decide_full_questions_pass_through() {
        let history = admissions_history();
        assert_eq!(
            decide(&history, "What is the library timing?"),
            RewriteDecision::PassThrough
        );
        assert_eq!(
            decide(&history, "How many seats are available for B.Sc. Agriculture?"),
            RewriteDecision::PassThrough
        );
    }

    #[tokio::test]
    async fn test_empty_history_never_calls_model() {
        let model = Arc::new(MockChatModel::failing("must not be called"));
        let ctx = Contextualizer::new(model.clone(), "rewrite".to_string(), 10);

        let out = ctx.contextualize(&[], "and the fee?").await;
        assert_eq!(out, "and the fee?");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_follow_up_is_rewritten_via_model() {
        let model = Arc::new(MockChatModel::replying(
            "What is the admission fee at the university?",
        ));
        let ctx = Contextualizer::new(model.clone(), "rewrite".to_string(), 10);

        let out = ctx.contextualize(&admissions_history(), "and the fee?").await;
        assert_eq!(out, "What is the admission fee at the university?");
        assert_eq!(model.call_count(), 1);
        // The raw question is the final user turn handed to the model
        assert_eq!(model.last_user_content().as_deref(), Some("and the fee?"));
        assert_eq!(model.calls.lock().unwrap()[0].system, "rewrite");
    }

    #[tokio::test]
    async fn test_full_question_bypasses_model_regardless_of_mock() {
        let model = Arc::new(MockChatModel::replying("SHOULD NOT APPEAR"));
        let ctx = Contextualizer::new(model.clone(), "rewrite".to_string(), 10);

        let out = ctx
            .contextualize(&admissions_history(), "What is the library timing?")
            .await;
        assert_eq!(out, "What is the library timing?");
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_failure_falls_back_to_raw_question() {
        let model = Arc::new(MockChatModel::failing("backend unreachable"));
        let ctx = Contextualizer::new(model, "rewrite".to_string(), 10);

        let out = ctx.contextualize(&admissions_history(), "and the fee?").await;
        assert_eq!(out, "and the fee?");
    }

    #[tokio::test]
    async fn test_empty_rewrite_falls_back_to_raw_question() {
        let model = Arc::new(MockChatModel::replying("   "));
        let ctx = Contextualizer::new(model, "rewrite".to_string(), 10);

        let out = ctx.contextualize(&admissions_history(), "and the fee?").await;
        assert_eq!(out, "and the fee?");
    }
}
