//! Corpus and chunk snapshot I/O
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{RagError, Result};
use crate::index::snapshot::{read_artifact, write_atomic};
use crate::types::{Chunk, Document};

/// Every `*.json` file in `dir`, sorted by file name
pub fn document_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(RagError::MissingArtifact(dir.display().to_string()));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Parse one document file
pub fn load_document(path: &Path) -> Result<Document> {
    let contents = fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| RagError::InvalidDocument {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Load the whole corpus in file-name order
///
/// A malformed document aborts the load; an empty directory is an error.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let paths = document_paths(dir)?;
    if paths.is_empty() {
        return Err(RagError::EmptyCorpus(format!(
            "no *.json documents in {}",
            dir.display()
        )));
    }

    let documents = paths
        .iter()
        .map(|path| {
            debug!(path = %path.display(), "loading document");
            load_document(path)
        })
        .collect::<Result<Vec<_>>>()?;

    info!(documents = documents.len(), dir = %dir.display(), "loaded corpus");
    Ok(documents)
}

/// Write the chunk snapshot atomically
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let json = serde_json::to_vec_pretty(chunks)?;
    write_atomic(path, &json)
}

/// Read a chunk snapshot
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let bytes = read_artifact(path)?;
    serde_json::from_slice(&bytes).map_err(|e| RagError::InvalidDocument {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;
    use tempfile::TempDir;

    const SELECT_DOC: &str = r#"{
        "doc_name": "sql-select",
        "url": "https://www.postgresql.org/docs/16/sql-select.html",
        "sections": [{"title": "Description", "text": "SELECT retrieves rows."}]
    }"#;

    #[test]
    fn test_loads_in_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), SELECT_DOC.replace("sql-select", "sql-update")).unwrap();
        fs::write(dir.path().join("a.json"), SELECT_DOC).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = load_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].doc_name, "sql-select");
        assert_eq!(docs[1].doc_name, "sql-update");
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"doc_name": "x", "sections": []}"#).unwrap();
        assert!(matches!(
            load_documents(dir.path()),
            Err(RagError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_documents(dir.path()),
            Err(RagError::EmptyCorpus(_))
        ));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load_documents(&dir.path().join("absent")),
            Err(RagError::MissingArtifact(_))
        ));
    }

    #[test]
    fn test_chunk_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chunks").join("chunks.json");
        let chunks = vec![Chunk {
            chunk_id: 0,
            text: "SELECT retrieves rows.".to_string(),
            metadata: ChunkMetadata {
                doc_name: "sql-select".to_string(),
                section_title: "Description".to_string(),
                url: "https://www.postgresql.org/docs/16/sql-select.html".to_string(),
            },
        }];

        write_chunks(&path, &chunks).unwrap();
        assert_eq!(read_chunks(&path).unwrap(), chunks);
    }
}
