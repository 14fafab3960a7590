//! Token splitting for the chunker
//!
//! A splitter maps text to the byte spans of its tokens. The chunker slices
//! the original text between span boundaries, so chunk text is always an
//! exact substring of the section and never a lossy decode.

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

/// Which token-counting scheme the chunk size constants refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// Maximal runs of non-whitespace characters
    #[default]
    Whitespace,
    /// A HuggingFace `tokenizer.json`
    Huggingface,
}

/// Splits text into token byte spans
pub trait TokenSplitter: Send + Sync {
    /// Stable name recorded in logs
    fn name(&self) -> &str;

    /// Byte spans of each token, in order, non-overlapping
    fn spans(&self, text: &str) -> Result<Vec<Range<usize>>>;

    /// Number of tokens in `text`
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.spans(text)?.len())
    }
}

/// Whitespace tokenizer: one token per run of non-whitespace characters
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl TokenSplitter for WhitespaceTokenizer {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn spans(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let mut spans = Vec::new();
        let mut start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            match (ch.is_whitespace(), start) {
                (true, Some(s)) => {
                    spans.push(s..idx);
                    start = None;
                }
                (false, None) => start = Some(idx),
                _ => {}
            }
        }
        if let Some(s) = start {
            spans.push(s..text.len());
        }

        Ok(spans)
    }
}

/// Subword tokenizer backed by the `tokenizers` crate
pub struct HfTokenizer {
    tokenizer: Tokenizer,
}

impl HfTokenizer {
    /// Load a `tokenizer.json`, disabling truncation and padding so the whole
    /// section is tokenized
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut tokenizer = Tokenizer::from_file(path).map_err(|e| {
            RagError::Tokenizer(format!("Failed to load {}: {}", path.display(), e))
        })?;
        tokenizer
            .with_truncation(None)
            .map_err(|e| RagError::Tokenizer(format!("Failed to disable truncation: {}", e)))?;
        tokenizer.with_padding(None);

        Ok(Self { tokenizer })
    }
}

impl TokenSplitter for HfTokenizer {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn spans(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| RagError::Tokenizer(format!("Tokenization failed: {}", e)))?;

        let mut spans = Vec::with_capacity(encoding.len());
        let mut floor = 0usize;
        for &(start, end) in encoding.get_offsets() {
            // Byte-level BPE can split a multi-byte char across tokens.
            let start = floor_char_boundary(text, start.max(floor));
            let end = ceil_char_boundary(text, end.min(text.len()));
            if start >= end {
                continue;
            }
            spans.push(start..end);
            floor = end;
        }

        Ok(spans)
    }
}

fn floor_char_boundary(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Build the splitter selected by configuration
pub fn build_splitter(
    kind: TokenizerKind,
    tokenizer_path: Option<&Path>,
) -> Result<Arc<dyn TokenSplitter>> {
    match kind {
        TokenizerKind::Whitespace => Ok(Arc::new(WhitespaceTokenizer)),
        TokenizerKind::Huggingface => {
            let path = tokenizer_path.ok_or_else(|| {
                RagError::ConfigError(
                    "chunking.tokenizer_path is required for the huggingface tokenizer".to_string(),
                )
            })?;
            Ok(Arc::new(HfTokenizer::from_file(path)?))
        }
    }
}
