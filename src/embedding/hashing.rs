//! Deterministic feature-hashing embedder
//!
//! Each normalized term is hashed with 64-bit FNV-1a into one of `dimension`
//! buckets with a sign taken from the top hash bit. Signed counts per bucket
//! are scaled sublinearly. Needs no model files, so it serves offline builds and
//! tests; lexical overlap is the only similarity it can see.

use crate::embedding::{l2_normalize, Embedder};
use crate::errors::{RagError, Result};
use crate::lexical;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Default bucket count
pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Feature-hashing bag-of-terms embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RagError::ConfigError(
                "hashing embedder dimension must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            model_id: format!("hashing-fnv1a-{}", dimension),
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut terms = lexical::terms(text);
        if terms.is_empty() {
            // Stop-word-only text still gets a stable, non-zero vector
            terms = text
                .split_whitespace()
                .map(str::to_lowercase)
                .collect();
        }

        // Signed counts, so colliding terms combine the same way in any order
        let mut counts: Vec<f32> = vec![0.0; self.dimension];
        for term in &terms {
            let hash = fnv1a(term.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            counts[bucket] += if hash >> 63 == 1 { -1.0 } else { 1.0 };
        }

        let mut vector: Vec<f32> = counts
            .iter()
            .map(|&c| if c != 0.0 { c.signum() * (1.0 + c.abs().ln()) } else { 0.0 })
            .collect();
        if vector.iter().all(|&x| x == 0.0) {
            // No terms, or every collision cancelled out
            vector[0] = 1.0;
        }
        l2_normalize(vector)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASHING_DIMENSION,
            model_id: format!("hashing-fnv1a-{}", DEFAULT_HASHING_DIMENSION),
        }
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }
}

/// 64-bit FNV-1a
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}
