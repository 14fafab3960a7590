pub mod engine;

pub use engine::{Retriever, SearchParams, DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
