//! Read-only vector store
pub mod vector_store;

pub use vector_store::{StoreStats, VectorStore, NO_MATCH};
