//! Retrieval-augmented question answering
//!
//! Components:
//! - Retriever: embeds the query and thresholds nearest chunks
//! - Relevance guard: lexical pre-filter for off-topic questions
//! - Prompt builder: grounded system/user prompts with bounded history
//! - Orchestrator: guard → retrieve → prompt → generate

pub mod guard;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod state;

pub use guard::{GuardConfig, RelevanceGuard};
pub use pipeline::{distinct_sources, Answer, QaOrchestrator, QaOutcome, OUT_OF_SCOPE_ANSWER};
pub use prompt::{build_prompt, PromptBuilder, PromptConfig, PromptPair, NOT_FOUND_ANSWER};
pub use retrieval::{Retriever, SearchParams};
pub use state::{QaEvent, QaState};
