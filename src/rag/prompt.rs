//! Grounded prompt assembly
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::errors::{RagError, Result};
use crate::types::{ConversationTurn, RetrievalResult};

/// Sentence the model must reply with when the context lacks the answer
pub const NOT_FOUND_ANSWER: &str = "The answer is not found in the provided PostgreSQL documentation.";

/// Default number of (user, assistant) pairs kept from history
pub const DEFAULT_MAX_TURNS: usize = 3;

const SYSTEM_PROMPT: &str = r#"You are an expert PostgreSQL documentation assistant.

Rules:
- Answer ONLY using the provided documentation context.
- Use chat history only to resolve references like "this", "that", or "it".
- If the answer is not present in the context, say:
  "The answer is not found in the provided PostgreSQL documentation."
- Do NOT use external knowledge.
- Cite sources using document names in square brackets."#;

/// Prompt configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// History pairs rendered into the prompt
    pub max_turns: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl PromptConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 {
            return Err(RagError::ConfigError(
                "prompt max_turns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// System and user prompt handed to the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Builds prompts from retrieved chunks and recent history
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    pub fn max_turns(&self) -> usize {
        self.config.max_turns
    }

    /// Build with the configured history window
    pub fn build(
        &self,
        retrieved: &[RetrievalResult],
        question: &str,
        history: Option<&[ConversationTurn]>,
    ) -> PromptPair {
        build_prompt(retrieved, question, history, self.config.max_turns)
    }
}

/// Render `retrieved` as numbered, source-tagged passages
pub fn format_context(retrieved: &[RetrievalResult]) -> String {
    let mut context = String::new();
    for (i, chunk) in retrieved.iter().enumerate() {
        let _ = write!(
            context,
            "[Source {}: {}]\n{}\n\n",
            i + 1,
            chunk.metadata.doc_name,
            chunk.text
        );
    }
    context
}

/// Render the last `max_turns` pairs of `history` in chronological order
///
/// `max_turns = 0` renders nothing; it never means "all turns".
pub fn format_history(history: &[ConversationTurn], max_turns: usize) -> String {
    let keep = max_turns.saturating_mul(2);
    let start = history.len().saturating_sub(keep);

    let mut rendered = String::new();
    for turn in &history[start..] {
        let _ = writeln!(rendered, "{}: {}", turn.role.label(), turn.content);
    }
    rendered
}

/// Assemble the system and user prompts
///
/// At most `max_turns` user/assistant pairs of `history` are included, so
/// `0` leaves the conversation block empty. `PromptConfig::validate`
/// rejects 0 for configured builders.
pub fn build_prompt(
    retrieved: &[RetrievalResult],
    question: &str,
    history: Option<&[ConversationTurn]>,
    max_turns: usize,
) -> PromptPair {
    let context = format_context(retrieved);
    let history = history
        .map(|turns| format_history(turns, max_turns))
        .unwrap_or_default();

    let user = format!(
        "Conversation so far:\n{}\n\nContext:\n{}\n\nQuestion:\n{}\n\nAnswer:",
        history, context, question
    );

    PromptPair {
        system: SYSTEM_PROMPT.to_string(),
        user: user.trim().to_string(),
    }
}
