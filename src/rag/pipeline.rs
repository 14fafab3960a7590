//! End-to-end question answering: guard → retrieve → prompt → generate
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{RagError, Result};
use crate::generation::{Generator, DEFAULT_TIMEOUT_SECS};
use crate::rag::guard::RelevanceGuard;
use crate::rag::prompt::PromptBuilder;
use crate::rag::retrieval::{Retriever, SearchParams};
use crate::rag::state::{QaEvent, QaState};
use crate::types::{ConversationTurn, RetrievalResult};

/// Reply for questions the corpus cannot answer
pub const OUT_OF_SCOPE_ANSWER: &str = "This question is outside the scope of PostgreSQL documentation.";

/// How a question was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaOutcome {
    /// The relevance guard rejected the question
    RejectedByGuard,
    /// Nothing in the index cleared the similarity threshold
    NoRelevantChunks,
    /// The generator produced an answer
    Answered,
}

impl QaOutcome {
    pub fn is_out_of_scope(&self) -> bool {
        !matches!(self, QaOutcome::Answered)
    }
}

/// Answer plus the documents it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Distinct document names used in the prompt, sorted
    pub sources: Vec<String>,
    pub outcome: QaOutcome,
    /// Chunks placed in the prompt, in rank order
    pub retrieved: Vec<RetrievalResult>,
}

impl Answer {
    fn out_of_scope(outcome: QaOutcome) -> Self {
        Self {
            text: OUT_OF_SCOPE_ANSWER.to_string(),
            sources: Vec::new(),
            outcome,
            retrieved: Vec::new(),
        }
    }
}

/// Sequences the pipeline stages for one question at a time
///
/// Holds only shared, read-only components, so one orchestrator serves any
/// number of concurrent questions.
pub struct QaOrchestrator {
    guard: RelevanceGuard,
    retriever: Arc<Retriever>,
    prompt_builder: PromptBuilder,
    generator: Arc<dyn Generator>,
    search: SearchParams,
    timeout: Duration,
}

impl QaOrchestrator {
    pub fn new(
        guard: RelevanceGuard,
        retriever: Arc<Retriever>,
        prompt_builder: PromptBuilder,
        generator: Arc<dyn Generator>,
    ) -> Self {
        let search = *retriever.default_params();
        Self {
            guard,
            retriever,
            prompt_builder,
            generator,
            search,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the generation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override retrieval parameters
    pub fn with_search_params(mut self, search: SearchParams) -> Result<Self> {
        search.validate()?;
        self.search = search;
        Ok(self)
    }

    pub fn search_params(&self) -> &SearchParams {
        &self.search
    }

    /// Answer `question`, using `history` only to resolve references
    ///
    /// Out-of-scope questions resolve to a fixed reply, not an error.
    /// Generation failures are returned as errors and never disguised as
    /// answers; check `RagError::is_retryable` before retrying.
    pub async fn answer_question(
        &self,
        question: &str,
        history: Option<&[ConversationTurn]>,
    ) -> Result<Answer> {
        let mut state = QaState::Guarding;

        if !self.guard.is_potentially_relevant(question) {
            state = state.transition(QaEvent::GuardRejected)?;
            debug!(state = state.display_name(), "question rejected by guard");
            return Ok(Answer::out_of_scope(QaOutcome::RejectedByGuard));
        }
        state = state.transition(QaEvent::GuardPassed)?;

        let retrieved = self.retrieve(question).await?;
        if retrieved.is_empty() {
            state = state.transition(QaEvent::NothingRetrieved)?;
            debug!(state = state.display_name(), "no chunk cleared the threshold");
            return Ok(Answer::out_of_scope(QaOutcome::NoRelevantChunks));
        }
        state = state.transition(QaEvent::ChunksRetrieved)?;

        let prompt = self.prompt_builder.build(&retrieved, question, history);
        let text = self.generate(&prompt.system, &prompt.user).await?;
        state = state.transition(QaEvent::AnswerGenerated)?;

        let sources = distinct_sources(&retrieved);
        info!(
            state = state.display_name(),
            generator = %self.generator.name(),
            chunks = retrieved.len(),
            sources = sources.len(),
            "answered question"
        );

        Ok(Answer {
            text,
            sources,
            outcome: QaOutcome::Answered,
            retrieved,
        })
    }

    /// Embedding is CPU-bound, so it runs off the async worker threads
    async fn retrieve(&self, question: &str) -> Result<Vec<RetrievalResult>> {
        let retriever = self.retriever.clone();
        let query = question.to_string();
        let SearchParams {
            top_k,
            similarity_threshold,
        } = self.search;

        tokio::task::spawn_blocking(move || retriever.retrieve(&query, top_k, similarity_threshold))
            .await
            .map_err(|e| RagError::Embedding(format!("Retrieval task failed: {}", e)))?
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.generator.generate(system_prompt, user_prompt))
            .await
        {
            Ok(result) => Ok(result?.trim().to_string()),
            Err(_) => Err(RagError::GenerationTimeout {
                duration_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

/// Distinct document names, sorted lexicographically
pub fn distinct_sources(retrieved: &[RetrievalResult]) -> Vec<String> {
    let mut sources: Vec<String> = retrieved
        .iter()
        .map(|r| r.metadata.doc_name.clone())
        .collect();
    sources.sort();
    sources.dedup();
    sources
}
