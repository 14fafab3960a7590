//! docqa - Retrieval-augmented question answering over documentation
//!
//! # Architecture
//!
//! - **Indexing** (offline): documents → `chunking` → `index` builder → index snapshot
//! - **Serving**: `store` → `rag` retriever → guard/prompt/orchestrator → `generation`
//!
//! Every serving component is immutable after construction and can be
//! shared across concurrent questions with `Arc`.

pub mod errors;
pub mod types;
pub mod lexical;
pub mod logging;

// Indexing pipeline
pub mod chunking;
pub mod corpus;
pub mod embedding;
pub mod index;

// Query pipeline
pub mod store;
pub mod rag;
pub mod generation;

pub mod cli;

// Re-export commonly used types
pub use errors::{RagError, Result};
pub use rag::{Answer, QaOrchestrator, QaOutcome};
pub use store::VectorStore;
