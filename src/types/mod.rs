//! Type definitions module
//! 
//! Typed records for the corpus, the chunk snapshot, the index metadata
//! table and the conversation passed in by callers.

pub mod document;
pub mod messages;

// Re-export commonly used types
pub use document::{Chunk, ChunkMetadata, Document, RetrievalResult, Section, VectorIndexEntry};
pub use messages::{ConversationTurn, Role};
