//! Overlapping token-window chunker
//!
//! # Algorithm
//!
//! ```text
//! start = 0
//! loop {
//!     end = start + chunk_size
//!     emit tokens[start..min(end, total)]
//!     if end >= total { break }
//!     start = end - overlap
//! }
//! ```
//!
//! Consecutive windows of one section share exactly `overlap` tokens and the
//! windows cover `[0, total)` without gaps. The last window may be short and
//! is never dropped.

use crate::chunking::tokenizer::{TokenSplitter, TokenizerKind};
use crate::errors::{RagError, Result};
use crate::types::{Chunk, ChunkMetadata, Document};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Default window size in tokens
pub const CHUNK_SIZE_TOKENS: usize = 500;

/// Default overlap between consecutive windows in tokens
pub const OVERLAP_TOKENS: usize = 100;

/// Chunking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in tokens
    pub chunk_size_tokens: usize,
    /// Tokens shared by consecutive windows
    pub overlap_tokens: usize,
    /// Token-counting scheme
    pub tokenizer: TokenizerKind,
    /// `tokenizer.json` for the huggingface scheme
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size_tokens: CHUNK_SIZE_TOKENS,
            overlap_tokens: OVERLAP_TOKENS,
            tokenizer: TokenizerKind::Whitespace,
            tokenizer_path: None,
        }
    }
}

impl ChunkingConfig {
    /// Window stride (`chunk_size - overlap`)
    pub fn stride(&self) -> usize {
        self.chunk_size_tokens.saturating_sub(self.overlap_tokens)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size_tokens == 0 {
            return Err(RagError::ConfigError(
                "chunk_size_tokens must be greater than 0".to_string(),
            ));
        }
        if self.overlap_tokens >= self.chunk_size_tokens {
            return Err(RagError::ConfigError(format!(
                "overlap_tokens ({}) must be less than chunk_size_tokens ({})",
                self.overlap_tokens, self.chunk_size_tokens
            )));
        }
        Ok(())
    }
}

/// Token ranges of the overlapping windows over `total` tokens
pub fn window_ranges(total: usize, chunk_size: usize, overlap: usize) -> Vec<Range<usize>> {
    let mut windows = Vec::new();
    if total == 0 || chunk_size == 0 || overlap >= chunk_size {
        return windows;
    }

    let mut start = 0;
    loop {
        let end = start + chunk_size;
        windows.push(start..end.min(total));
        if end >= total {
            break;
        }
        start = end - overlap;
    }
    windows
}

/// Splits documents into overlapping token windows
#[derive(Clone)]
pub struct Chunker {
    config: ChunkingConfig,
    splitter: Arc<dyn TokenSplitter>,
}

impl Chunker {
    /// Create a chunker; rejects window settings that would never advance
    pub fn new(config: ChunkingConfig, splitter: Arc<dyn TokenSplitter>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, splitter })
    }

    /// Chunk one document. Ids start at 0 and increase across sections.
    pub fn chunk_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut next_id: u64 = 0;

        for section in &document.sections {
            let text = section.text.trim();
            if text.is_empty() {
                debug!(doc = %document.doc_name, section = %section.title, "skipping empty section");
                continue;
            }

            for piece in self.chunk_text(text)? {
                chunks.push(Chunk {
                    chunk_id: next_id,
                    text: piece,
                    metadata: ChunkMetadata {
                        doc_name: document.doc_name.clone(),
                        section_title: section.title.clone(),
                        url: document.url.clone(),
                    },
                });
                next_id += 1;
            }
        }

        debug!(
            doc = %document.doc_name,
            chunks = chunks.len(),
            tokenizer = self.splitter.name(),
            "chunked document"
        );
        Ok(chunks)
    }

    /// Chunk every document in order, concatenating the results
    pub fn chunk_corpus(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut all = Vec::new();
        for document in documents {
            all.extend(self.chunk_document(document)?);
        }
        Ok(all)
    }

    /// Split one section's text into trimmed window texts
    pub fn chunk_text(&self, text: &str) -> Result<Vec<String>> {
        let spans = self.splitter.spans(text)?;
        let windows = window_ranges(
            spans.len(),
            self.config.chunk_size_tokens,
            self.config.overlap_tokens,
        );

        let pieces = windows
            .into_iter()
            .map(|w| text[spans[w.start].start..spans[w.end - 1].end].trim())
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect();

        Ok(pieces)
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::tokenizer::WhitespaceTokenizer;
    use crate::types::Section;

    fn chunker(size: usize, overlap: usize) -> Chunker {
        let config = ChunkingConfig {
            chunk_size_tokens: size,
            overlap_tokens: overlap,
            ..Default::default()
        };
        Chunker::new(config, Arc::new(WhitespaceTokenizer)).unwrap()
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    fn doc(sections: Vec<(&str, String)>) -> Document {
        Document {
            doc_name: "sql-select".to_string(),
            url: "https://www.postgresql.org/docs/16/sql-select.html".to_string(),
            sections: sections
                .into_iter()
                .map(|(title, text)| Section {
                    title: title.to_string(),
                    text,
                })
                .collect(),
        }
    }

    #[test]
    fn test_default_config() {
        let config = ChunkingConfig::default();
        assert_eq!(config.chunk_size_tokens, 500);
        assert_eq!(config.overlap_tokens, 100);
        assert_eq!(config.stride(), 400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_non_advancing_window() {
        let config = ChunkingConfig {
            chunk_size_tokens: 100,
            overlap_tokens: 100,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ChunkingConfig {
            chunk_size_tokens: 0,
            overlap_tokens: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_window_ranges_defaults() {
        assert!(window_ranges(0, 500, 100).is_empty());
        assert_eq!(window_ranges(500, 500, 100), vec![0..500]);
        assert_eq!(window_ranges(501, 500, 100), vec![0..500, 400..501]);
        assert_eq!(window_ranges(1000, 500, 100), vec![0..500, 400..900, 800..1000]);
    }

    #[test]
    fn test_empty_section_emits_nothing() {
        let chunks = chunker(5, 1)
            .chunk_document(&doc(vec![("Empty", "   \n\t ".to_string())]))
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_section_single_trimmed_chunk() {
        let text = "\n  SELECT retrieves rows from zero or more tables.  \n".to_string();
        let chunks = chunker(500, 100)
            .chunk_document(&doc(vec![("Description", text.clone())]))
            .unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text.trim());
        assert_eq!(chunks[0].chunk_id, 0);
        assert_eq!(chunks[0].metadata.section_title, "Description");
    }

    #[test]
    fn test_overlap_between_windows() {
        let pieces = chunker(5, 2).chunk_text(&words(12)).unwrap();
        assert_eq!(
            pieces,
            vec![
                "w0 w1 w2 w3 w4",
                "w3 w4 w5 w6 w7",
                "w6 w7 w8 w9 w10",
                "w9 w10 w11",
            ]
        );
    }

    #[test]
    fn test_inner_whitespace_preserved() {
        let text = "CODE:\nSELECT *\n    FROM films;";
        let pieces = chunker(500, 100).chunk_text(text).unwrap();
        assert_eq!(pieces, vec![text.to_string()]);
    }

    #[test]
    fn test_ids_sequential_across_sections() {
        let document = doc(vec![
            ("Synopsis", words(12)),
            ("Empty", String::new()),
            ("Description", words(3)),
        ]);
        let chunks = chunker(5, 2).chunk_document(&document).unwrap();

        let ids: Vec<u64> = chunks.iter().map(|c| c.chunk_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(chunks[4].metadata.section_title, "Description");
        assert!(chunks.iter().all(|c| c.metadata.doc_name == "sql-select"));
    }

    #[test]
    fn test_ids_restart_per_document() {
        let c = chunker(5, 2);
        let mut other = doc(vec![("Intro", words(7))]);
        other.doc_name = "sql-insert".to_string();

        let chunks = c
            .chunk_corpus(&[doc(vec![("Intro", words(7))]), other])
            .unwrap();
        let ids: Vec<(String, u64)> = chunks
            .iter()
            .map(|c| (c.metadata.doc_name.clone(), c.chunk_id))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("sql-select".to_string(), 0),
                ("sql-select".to_string(), 1),
                ("sql-insert".to_string(), 0),
                ("sql-insert".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_chunking_is_idempotent() {
        let document = doc(vec![("A", words(40)), ("B", words(9))]);
        let c = chunker(8, 3);
        let first = serde_json::to_vec(&c.chunk_document(&document).unwrap()).unwrap();
        let second = serde_json::to_vec(&c.chunk_document(&document).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_document_not_mutated() {
        let document = doc(vec![("A", "  padded text  ".to_string())]);
        let before = document.clone();
        chunker(5, 1).chunk_document(&document).unwrap();
        assert_eq!(document, before);
    }
}
