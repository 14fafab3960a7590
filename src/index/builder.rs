//! Embedding index builder
//!
//! Embeds the ordered chunk set in batches and assembles the vector index and
//! its metadata table. Batches may run concurrently on blocking threads; the
//! ordered `buffered` stream hands results back in submission order, so row
//! `i` always belongs to chunk `i`.

use futures_util::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::embedding::{l2_normalize, Embedder};
use crate::errors::{RagError, Result};
use crate::index::snapshot::{write_metadata, VectorIndex};
use crate::types::{Chunk, VectorIndexEntry};

/// Index and metadata built together
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub index: VectorIndex,
    pub entries: Vec<VectorIndexEntry>,
}

impl BuiltIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builds an index snapshot from chunks
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    concurrency: usize,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            concurrency: num_cpus::get().max(1),
        }
    }

    /// Number of batches embedded at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fail if a snapshot already at `index_path` was built with another dimension
    pub fn check_existing(&self, index_path: &Path) -> Result<()> {
        if let Some(header) = VectorIndex::read_header(index_path)? {
            if header.dimension != self.embedder.dimension() {
                return Err(RagError::DimensionMismatch {
                    expected: header.dimension,
                    actual: self.embedder.dimension(),
                });
            }
        }
        Ok(())
    }

    /// Embed all chunks and assemble the index
    ///
    /// `on_progress` receives the number of chunks embedded so far.
    pub async fn build<F>(&self, chunks: &[Chunk], on_progress: F) -> Result<BuiltIndex>
    where
        F: Fn(usize),
    {
        if chunks.is_empty() {
            return Err(RagError::EmptyCorpus(
                "no chunks to index; run the chunker first".to_string(),
            ));
        }

        let vectors = self.embed_all(chunks, on_progress).await?;
        let index = VectorIndex::new(self.embedder.model_id(), self.embedder.dimension(), vectors)?;
        let entries = chunks.iter().map(VectorIndexEntry::from).collect();

        info!(
            rows = index.len(),
            dimension = index.dimension(),
            model = index.model_id(),
            "built vector index"
        );
        Ok(BuiltIndex { index, entries })
    }

    /// Build and persist both artifacts (vectors first, then metadata)
    pub async fn build_to<F>(
        &self,
        chunks: &[Chunk],
        index_path: &Path,
        metadata_path: &Path,
        on_progress: F,
    ) -> Result<BuiltIndex>
    where
        F: Fn(usize),
    {
        self.check_existing(index_path)?;
        let built = self.build(chunks, on_progress).await?;

        built.index.write(index_path)?;
        write_metadata(metadata_path, &built.entries)?;

        info!(
            index = %index_path.display(),
            metadata = %metadata_path.display(),
            "wrote index snapshot"
        );
        Ok(built)
    }

    async fn embed_all<F>(&self, chunks: &[Chunk], on_progress: F) -> Result<Vec<Vec<f32>>>
    where
        F: Fn(usize),
    {
        let dimension = self.embedder.dimension();
        let batches: Vec<Vec<String>> = chunks
            .chunks(self.batch_size)
            .map(|batch| batch.iter().map(|c| c.text.clone()).collect())
            .collect();

        let embedder = self.embedder.clone();
        let mut results = stream::iter(batches)
            .map(move |texts| {
                let embedder = embedder.clone();
                tokio::task::spawn_blocking(move || {
                    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                    embedder
                        .embed_batch(&refs)
                        .map(|vectors| (refs.len(), vectors))
                })
            })
            .buffered(self.concurrency);

        let mut vectors = Vec::with_capacity(chunks.len());
        while let Some(joined) = results.next().await {
            let (expected, batch) = joined
                .map_err(|e| RagError::Embedding(format!("Embedding task failed: {}", e)))??;
            if batch.len() != expected {
                return Err(RagError::Embedding(format!(
                    "Embedder returned {} vectors for {} texts",
                    batch.len(),
                    expected
                )));
            }

            for vector in batch {
                if vector.len() != dimension {
                    return Err(RagError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                    });
                }
                vectors.push(l2_normalize(vector)?);
            }
            on_progress(vectors.len());
        }

        Ok(vectors)
    }
}
