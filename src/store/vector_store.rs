//! Brute-force inner-product vector store
//!
//! Loaded once from an index snapshot and never mutated afterwards; share it
//! across queries with `Arc`. Rebuilding means writing a new snapshot and
//! opening a new store.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use tracing::info;

use crate::errors::{RagError, Result};
use crate::index::{read_metadata, VectorIndex};
use crate::types::VectorIndexEntry;

/// Row id that never refers to a stored chunk
pub const NO_MATCH: i64 = -1;

/// Store statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub rows: usize,
    pub dimension: usize,
    pub model_id: String,
    pub documents: usize,
}

/// Index rows plus their co-indexed metadata
#[derive(Debug, Clone)]
pub struct VectorStore {
    index: VectorIndex,
    entries: Vec<VectorIndexEntry>,
}

impl VectorStore {
    /// Load both snapshot artifacts; any inconsistency is fatal
    pub fn open(index_path: &Path, metadata_path: &Path) -> Result<Self> {
        let index = VectorIndex::read(index_path)?;
        let entries = read_metadata(metadata_path)?;
        let store = Self::from_parts(index, entries)?;

        info!(
            rows = store.len(),
            dimension = store.dimension(),
            model = store.model_id(),
            "loaded vector store"
        );
        Ok(store)
    }

    /// Pair an in-memory index with its metadata
    pub fn from_parts(index: VectorIndex, entries: Vec<VectorIndexEntry>) -> Result<Self> {
        if index.len() != entries.len() {
            return Err(RagError::RowCountMismatch {
                index_rows: index.len(),
                metadata_rows: entries.len(),
            });
        }
        Ok(Self { index, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn model_id(&self) -> &str {
        self.index.model_id()
    }

    /// Metadata table in row order
    pub fn entries(&self) -> &[VectorIndexEntry] {
        &self.entries
    }

    /// Metadata for `row`; `None` for `NO_MATCH` or out-of-range rows
    pub fn entry(&self, row: i64) -> Option<&VectorIndexEntry> {
        usize::try_from(row).ok().and_then(|r| self.entries.get(r))
    }

    /// Top `k` rows by inner product with `query`
    ///
    /// Results are ordered by descending score, ties by ascending row. When
    /// fewer than `k` rows exist the list is truncated rather than padded, so
    /// the allocation is bounded by the store size whatever `k` is.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(i64, f32)>> {
        if query.len() != self.dimension() {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        let mut scored: Vec<(i64, f32)> = self
            .index
            .rows()
            .enumerate()
            .map(|(row, vector)| (row as i64, dot(query, vector)))
            .collect();

        scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });
        scored.truncate(k);

        Ok(scored)
    }

    pub fn stats(&self) -> StoreStats {
        let mut docs: Vec<&str> = self.entries.iter().map(|e| e.doc_name.as_str()).collect();
        docs.sort_unstable();
        docs.dedup();

        StoreStats {
            rows: self.len(),
            dimension: self.dimension(),
            model_id: self.model_id().to_string(),
            documents: docs.len(),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::write_metadata;
    use tempfile::TempDir;

    fn entry(id: u64, doc: &str) -> VectorIndexEntry {
        VectorIndexEntry {
            chunk_id: id,
            text: format!("chunk {}", id),
            doc_name: doc.to_string(),
            section_title: "Synopsis".to_string(),
            url: format!("https://www.postgresql.org/docs/16/{}.html", doc),
        }
    }

    fn store() -> VectorStore {
        let index = VectorIndex::new(
            "test-model",
            2,
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]],
        )
        .unwrap();
        VectorStore::from_parts(
            index,
            vec![entry(0, "sql-select"), entry(1, "sql-insert"), entry(2, "sql-select")],
        )
        .unwrap()
    }

    #[test]
    fn test_search_ranks_by_score() {
        let results = store().search(&[0.0, 1.0], 3).unwrap();
        let rows: Vec<i64> = results.iter().map(|r| r.0).collect();
        assert_eq!(rows, vec![1, 2, 0]);
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert!((results[1].1 - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_search_truncates_when_k_exceeds_rows() {
        let results = store().search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|(row, _)| *row != NO_MATCH));
    }

    #[test]
    fn test_search_huge_k_is_bounded_by_rows() {
        let results = store().search(&[1.0, 0.0], usize::MAX).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, 0);
    }

    #[test]
    fn test_search_empty_store() {
        let index = VectorIndex::new("m", 2, Vec::new()).unwrap();
        let store = VectorStore::from_parts(index, Vec::new()).unwrap();
        assert!(store.search(&[1.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_search_ties_break_by_row() {
        let index = VectorIndex::new("m", 2, vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 0.0]])
            .unwrap();
        let store =
            VectorStore::from_parts(index, vec![entry(0, "a"), entry(1, "b"), entry(2, "c")])
                .unwrap();
        let results = store.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results[0].0, 1);
        assert_eq!(results[1].0, 2);
    }

    #[test]
    fn test_search_rejects_wrong_dimension() {
        assert!(matches!(
            store().search(&[1.0, 0.0, 0.0], 1),
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_search_zero_k() {
        assert!(store().search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_row_count_mismatch() {
        let index = VectorIndex::new("m", 2, vec![vec![1.0, 0.0]]).unwrap();
        let result = VectorStore::from_parts(index, vec![entry(0, "a"), entry(1, "b")]);
        assert!(matches!(
            result,
            Err(RagError::RowCountMismatch {
                index_rows: 1,
                metadata_rows: 2
            })
        ));
    }

    #[test]
    fn test_entry_lookup() {
        let store = store();
        assert_eq!(store.entry(1).unwrap().doc_name, "sql-insert");
        assert!(store.entry(NO_MATCH).is_none());
        assert!(store.entry(3).is_none());
    }

    #[test]
    fn test_stats() {
        let stats = store().stats();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.dimension, 2);
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.model_id, "test-model");
    }

    #[test]
    fn test_open_missing_metadata() {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("index.bin");
        VectorIndex::new("m", 2, vec![vec![1.0, 0.0]])
            .unwrap()
            .write(&index_path)
            .unwrap();

        let result = VectorStore::open(&index_path, &dir.path().join("metadata.json"));
        assert!(matches!(result, Err(RagError::MissingArtifact(_))));
    }

    #[test]
    fn test_open_round_trip() {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("index.bin");
        let metadata_path = dir.path().join("metadata.json");
        VectorIndex::new("m", 2, vec![vec![1.0, 0.0]])
            .unwrap()
            .write(&index_path)
            .unwrap();
        write_metadata(&metadata_path, &[entry(0, "sql-vacuum")]).unwrap();

        let store = VectorStore::open(&index_path, &metadata_path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.entry(0).unwrap().doc_name, "sql-vacuum");
    }
}
