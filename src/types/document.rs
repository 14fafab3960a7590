//! Corpus and index records
//!
//! Every record here is validated at deserialization time: unknown or
//! missing fields are parse errors, never silently defaulted.

use serde::{Deserialize, Serialize};

/// A source document as produced by the ingestion step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    /// Unique document identifier (e.g. `sql-select`)
    pub doc_name: String,
    pub url: String,
    /// Ordered sections
    pub sections: Vec<Section>,
}

/// A titled section of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Section {
    pub title: String,
    pub text: String,
}

/// Back-reference from a chunk to the document and section it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChunkMetadata {
    pub doc_name: String,
    pub section_title: String,
    pub url: String,
}

/// A bounded, overlapping slice of a section's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Chunk {
    /// Sequential within one document's chunking run, starting at 0
    pub chunk_id: u64,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// One row of the metadata table; row `i` describes vector `i` of the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VectorIndexEntry {
    pub chunk_id: u64,
    pub text: String,
    pub doc_name: String,
    pub section_title: String,
    pub url: String,
}

impl From<&Chunk> for VectorIndexEntry {
    fn from(chunk: &Chunk) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            text: chunk.text.clone(),
            doc_name: chunk.metadata.doc_name.clone(),
            section_title: chunk.metadata.section_title.clone(),
            url: chunk.metadata.url.clone(),
        }
    }
}

impl VectorIndexEntry {
    /// Metadata view of this row
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            doc_name: self.doc_name.clone(),
            section_title: self.section_title.clone(),
            url: self.url.clone(),
        }
    }
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Cosine similarity in [-1, 1]
    pub score: f32,
    pub text: String,
    pub metadata: ChunkMetadata,
}
