//! Text embedding
//!
//! Every embedder returns L2-normalized vectors so that the raw inner product
//! used by the vector store is cosine similarity. Indexing and querying must
//! use the same embedder; the store records the model id to enforce it.

pub mod candle;
pub mod hashing;

pub use self::candle::{CandleEmbedder, DEFAULT_MODEL_ID};
pub use self::hashing::{HashingEmbedder, DEFAULT_HASHING_DIMENSION};

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maps text to fixed-dimension unit vectors
pub trait Embedder: Send + Sync {
    /// Identifier persisted in the index header
    fn model_id(&self) -> &str;

    /// Output dimension
    fn dimension(&self) -> usize;

    /// Embed a batch, preserving input order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| RagError::Embedding("Embedder returned no vector".to_string()))
    }
}

/// Scale `vector` to unit length
///
/// Zero, NaN or infinite norms are errors: such a vector has no direction
/// and would silently corrupt similarity scores.
pub fn l2_normalize(mut vector: Vec<f32>) -> Result<Vec<f32>> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if !norm.is_finite() || norm <= f32::EPSILON {
        return Err(RagError::Embedding(format!(
            "Cannot normalize vector with norm {}",
            norm
        )));
    }
    for x in vector.iter_mut() {
        *x /= norm;
    }
    Ok(vector)
}

/// Which embedder implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// BERT sentence-transformer via Candle
    #[default]
    Candle,
    /// Offline feature hashing
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    /// HuggingFace model id for the candle backend
    pub model_id: String,
    /// Bucket count for the hashing backend
    pub dimension: usize,
    /// Texts per embedding call while indexing
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Candle,
            model_id: DEFAULT_MODEL_ID.to_string(),
            dimension: DEFAULT_HASHING_DIMENSION,
            batch_size: 32,
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(RagError::ConfigError(
                "embedding batch_size must be greater than 0".to_string(),
            ));
        }
        if self.backend == EmbeddingBackend::Hashing && self.dimension == 0 {
            return Err(RagError::ConfigError(
                "embedding dimension must be greater than 0".to_string(),
            ));
        }
        if self.backend == EmbeddingBackend::Candle && self.model_id.trim().is_empty() {
            return Err(RagError::ConfigError(
                "embedding model_id is required for the candle backend".to_string(),
            ));
        }
        Ok(())
    }
}

/// Construct the configured embedder
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    config.validate()?;
    match config.backend {
        EmbeddingBackend::Candle => Ok(Arc::new(CandleEmbedder::new(&config.model_id)?)),
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension)?)),
    }
}
