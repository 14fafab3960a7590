//! Error types for docqa
//!
//! Structural problems (bad documents, corrupt or mismatched index snapshots,
//! invalid configuration) are fatal. Generation failures are classified so the
//! caller can decide whether to retry. "No good match" is never an error.

use thiserror::Error;

/// Main error type for the docqa pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Document JSON did not match the expected shape
    #[error("Invalid document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    /// Nothing to index
    #[error("Corpus is empty: {0}")]
    EmptyCorpus(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Tokenizer loading or encoding errors
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A snapshot artifact is missing on disk
    #[error("Missing index artifact: {0}")]
    MissingArtifact(String),

    /// A snapshot artifact exists but cannot be decoded
    #[error("Corrupt index snapshot {path}: {reason}")]
    IndexCorrupt { path: String, reason: String },

    /// Vector index and metadata table disagree on row count
    #[error("Index has {index_rows} rows but metadata has {metadata_rows} rows")]
    RowCountMismatch {
        index_rows: usize,
        metadata_rows: usize,
    },

    /// Embedding dimension differs from the one the index was built with
    #[error("Embedding dimension mismatch: index has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query embedder is not the model the index was built with
    #[error("Embedding model mismatch: index built with '{expected}', query embedder is '{actual}'")]
    ModelMismatch { expected: String, actual: String },

    /// Generation backend returned an error
    #[error("Generation failed: {message}")]
    Generation { message: String, retryable: bool },

    /// Generation backend did not answer in time
    #[error("Generation timed out after {duration_ms}ms")]
    GenerationTimeout { duration_ms: u64 },

    /// Generation backend is throttling requests
    #[error("Generation rate limited: {0}")]
    RateLimited(String),

    /// Orchestrator state machine errors
    #[error("Invalid state transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for docqa operations
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            RagError::GenerationTimeout { .. } | RagError::RateLimited(_) => true,
            RagError::Generation { retryable, .. } => *retryable,
            RagError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}

impl From<candle_core::Error> for RagError {
    fn from(err: candle_core::Error) -> Self {
        RagError::Embedding(err.to_string())
    }
}
