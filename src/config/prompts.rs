//! Prompt templates for Aula.
//!
//! Prompts can be customized by placing TOML files in the custom prompts
//! directory. The `{{university}}` variable defaults to a generic name and is
//! typically overridden in config.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub contextualize: ContextualizePrompts,
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for rewriting follow-up questions into standalone queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextualizePrompts {
    pub system: String,
}

impl Default for ContextualizePrompts {
    fn default() -> Self {
        Self {
            system: r#"You reformulate user questions for a document retrieval system at {{university}}.

Given the chat history and the latest user message, produce a single standalone question that can be understood without the history.

Rules:
- If the latest message already stands on its own, return it unchanged.
- If it is a short or vague follow-up (pronouns, fragments, "and the fee?"), rewrite it into a complete question that preserves the user's intent and the topic of the preceding turns.
- NEVER answer the question. Output the reformulated question and nothing else."#
                .to_string(),
        }
    }
}

/// Prompts and fixed sentences for grounded answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
    pub user: String,
    /// Returned verbatim when retrieval produces no documents.
    pub no_context: String,
    /// Returned verbatim when the completion call fails or comes back empty.
    pub failure: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful assistant for {{university}}. Your role is to answer questions only based on the admission and course information provided in the context below.

Guidelines:
- Answer using only the provided context, never outside knowledge
- If the context does not contain the answer, you MUST reply exactly: "{{no_context}}"
- Prefer lists and **emphasis** when they make the answer easier to scan
- Be concise and factual"#
                .to_string(),

            user: r#"CONTEXT:
{{context}}

QUESTION:
{{question}}

Answer the question based only on the context above."#
                .to_string(),

            no_context: "I don't have information about that in the provided documents. \
                         Please check the official university prospectus or website."
                .to_string(),

            failure: "I'm sorry, I couldn't generate a response just now. \
                      Please try again in a moment."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }
        prompts
            .variables
            .entry("university".to_string())
            .or_insert_with(|| "the university".to_string());

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let contextualize_path = custom_path.join("contextualize.toml");
            if contextualize_path.exists() {
                let content = std::fs::read_to_string(&contextualize_path)?;
                prompts.contextualize = toml::from_str(&content)?;
            }

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// The fully rendered answer system prompt.
    pub fn answer_system(&self) -> String {
        let mut vars = std::collections::HashMap::new();
        vars.insert("no_context".to_string(), self.answer.no_context.clone());
        self.render_with_custom(&self.answer.system, &vars)
    }

    /// The fully rendered contextualization system prompt.
    pub fn contextualize_system(&self) -> String {
        self.render_with_custom(&self.contextualize.system, &std::collections::HashMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.contextualize.system.is_empty());
        assert!(!prompts.answer.system.is_empty());
        assert!(!prompts.answer.no_context.is_empty());
        assert!(!prompts.answer.failure.is_empty());
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_university_variable() {
        let mut vars = std::collections::HashMap::new();
        vars.insert("university".to_string(), "Punjab Agricultural University".to_string());
        let prompts = Prompts::load(None, Some(&vars)).unwrap();

        assert!(prompts.answer_system().contains("Punjab Agricultural University"));
        assert!(prompts.contextualize_system().contains("Punjab Agricultural University"));
        assert!(!prompts.answer_system().contains("{{university}}"));
    }

    #[test]
    fn test_no_context_sentence_rendered_into_system() {
        let prompts = Prompts::load(None, None).unwrap();
        assert!(prompts.answer_system().contains(&prompts.answer.no_context));
    }
}
