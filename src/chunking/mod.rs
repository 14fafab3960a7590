//! Document chunking
//!
//! Splits each section of a document into overlapping, token-bounded
//! windows. Token counting is pluggable; see [`tokenizer`].

pub mod chunker;
pub mod tokenizer;

pub use chunker::{window_ranges, Chunker, ChunkingConfig, CHUNK_SIZE_TOKENS, OVERLAP_TOKENS};
pub use tokenizer::{build_splitter, HfTokenizer, TokenSplitter, TokenizerKind, WhitespaceTokenizer};
