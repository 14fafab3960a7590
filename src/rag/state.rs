//! Question-answering state machine
//!
//! Every query runs through the same deterministic sequence:
//!
//! ```text
//! Guarding   → Done        (on: GuardRejected)
//! Guarding   → Retrieving  (on: GuardPassed)
//! Retrieving → Done        (on: NothingRetrieved)
//! Retrieving → Generating  (on: ChunksRetrieved)
//! Generating → Done        (on: AnswerGenerated)
//! ```
//!
//! `Done` is terminal; any other pair is an invalid transition.

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};

/// Orchestrator states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QaState {
    /// Running the relevance guard
    Guarding,

    /// Searching the vector store
    Retrieving,

    /// Waiting on the generator
    Generating,

    /// Finished (terminal)
    Done,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaEvent {
    GuardPassed,
    GuardRejected,
    ChunksRetrieved,
    NothingRetrieved,
    AnswerGenerated,
}

impl QaState {
    /// Attempt a transition
    pub fn transition(&self, event: QaEvent) -> Result<QaState> {
        use QaEvent::*;
        use QaState::*;

        let next = match (self, event) {
            (Guarding, GuardRejected) => Done,
            (Guarding, GuardPassed) => Retrieving,
            (Retrieving, NothingRetrieved) => Done,
            (Retrieving, ChunksRetrieved) => Generating,
            (Generating, AnswerGenerated) => Done,
            (from, event) => {
                return Err(RagError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            QaState::Guarding => "Checking relevance",
            QaState::Retrieving => "Retrieving",
            QaState::Generating => "Generating answer",
            QaState::Done => "Done",
        }
    }
}
