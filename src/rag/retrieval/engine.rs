//! Retrieval engine for semantic search over the vector store
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::store::{VectorStore, NO_MATCH};
use crate::types::RetrievalResult;

/// Default number of candidates requested from the store
pub const DEFAULT_TOP_K: usize = 5;

/// Default minimum cosine similarity
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.25;

/// Search parameters for retrieval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    /// Maximum number of results to retrieve
    pub top_k: usize,
    /// Minimum similarity score (-1.0 to 1.0)
    pub similarity_threshold: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl SearchParams {
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(RagError::ConfigError(
                "retrieval top_k must be at least 1".to_string(),
            ));
        }
        if !self.similarity_threshold.is_finite() {
            return Err(RagError::ConfigError(
                "retrieval similarity_threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Embeds queries and returns thresholded nearest chunks
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn Embedder>,
    default_params: SearchParams,
}

impl Retriever {
    /// Create a retriever; the embedder must be the one the store was built with
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if embedder.model_id() != store.model_id() {
            return Err(RagError::ModelMismatch {
                expected: store.model_id().to_string(),
                actual: embedder.model_id().to_string(),
            });
        }
        if embedder.dimension() != store.dimension() {
            return Err(RagError::DimensionMismatch {
                expected: store.dimension(),
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            store,
            embedder,
            default_params: SearchParams::default(),
        })
    }

    /// Create with custom default parameters
    pub fn with_params(mut self, params: SearchParams) -> Result<Self> {
        params.validate()?;
        self.default_params = params;
        Ok(self)
    }

    /// Retrieve with the default parameters
    pub fn retrieve_default(&self, query: &str) -> Result<Vec<RetrievalResult>> {
        self.retrieve(
            query,
            self.default_params.top_k,
            self.default_params.similarity_threshold,
        )
    }

    /// Retrieve at most `top_k` chunks scoring at least `similarity_threshold`
    ///
    /// Results keep the store's order (descending score). An empty list means
    /// nothing in the corpus is close enough and is not an error.
    pub fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        similarity_threshold: f32,
    ) -> Result<Vec<RetrievalResult>> {
        SearchParams {
            top_k,
            similarity_threshold,
        }
        .validate()?;

        let query_vector = self.embedder.embed(query)?;
        let candidates = self.store.search(&query_vector, top_k)?;

        let mut results = Vec::with_capacity(candidates.len());
        for (row, score) in candidates {
            if row == NO_MATCH || score < similarity_threshold {
                continue;
            }
            let entry = self.store.entry(row).ok_or_else(|| RagError::IndexCorrupt {
                path: "metadata".to_string(),
                reason: format!("no metadata for row {}", row),
            })?;
            results.push(RetrievalResult {
                score,
                text: entry.text.clone(),
                metadata: entry.metadata(),
            });
        }

        debug!(
            requested = top_k,
            kept = results.len(),
            threshold = similarity_threshold,
            "retrieved chunks"
        );
        Ok(results)
    }

    /// Get default search parameters
    pub fn default_params(&self) -> &SearchParams {
        &self.default_params
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}
