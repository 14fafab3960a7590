//! On-disk index snapshot
//!
//! Two co-indexed artifacts: a binary vector file and a JSON metadata table.
//! Row `i` of the metadata describes vector `i`.
//!
//! Vector file layout (little-endian):
//!
//! ```text
//! magic      [u8; 4] = "DQIX"
//! version    u32     = 1
//! dimension  u32
//! rows       u64
//! id_len     u32
//! model_id   [u8; id_len]   utf-8
//! vectors    [f32; rows * dimension]   row-major
//! ```

use bytes::{Buf, BufMut, BytesMut};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{RagError, Result};
use crate::types::VectorIndexEntry;

/// File magic
pub const INDEX_MAGIC: &[u8; 4] = b"DQIX";

/// Current format version
pub const INDEX_VERSION: u32 = 1;

/// Fixed-size part of the header preceding the model id
const FIXED_HEADER_LEN: usize = 4 + 4 + 4 + 8 + 4;

/// Header fields of a vector file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub dimension: usize,
    pub rows: usize,
    pub model_id: String,
}

/// Dense row-major matrix of unit vectors
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    header: IndexHeader,
    data: Vec<f32>,
}

impl VectorIndex {
    /// Assemble an index from vectors that all have `dimension` entries
    pub fn new(model_id: &str, dimension: usize, vectors: Vec<Vec<f32>>) -> Result<Self> {
        let rows = vectors.len();
        let mut data = Vec::with_capacity(rows * dimension);
        for vector in vectors {
            if vector.len() != dimension {
                return Err(RagError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend(vector);
        }

        Ok(Self {
            header: IndexHeader {
                dimension,
                rows,
                model_id: model_id.to_string(),
            },
            data,
        })
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    pub fn dimension(&self) -> usize {
        self.header.dimension
    }

    pub fn len(&self) -> usize {
        self.header.rows
    }

    pub fn is_empty(&self) -> bool {
        self.header.rows == 0
    }

    pub fn model_id(&self) -> &str {
        &self.header.model_id
    }

    /// Vector at `row`
    pub fn row(&self, row: usize) -> &[f32] {
        let d = self.header.dimension;
        &self.data[row * d..(row + 1) * d]
    }

    /// Iterate rows in order
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics; a zero-dimension index has no data anyway
        self.data.chunks_exact(self.header.dimension.max(1))
    }

    /// Serialize to the vector file format
    pub fn encode(&self) -> BytesMut {
        let id = self.header.model_id.as_bytes();
        let mut buf = BytesMut::with_capacity(FIXED_HEADER_LEN + id.len() + self.data.len() * 4);
        buf.put_slice(INDEX_MAGIC);
        buf.put_u32_le(INDEX_VERSION);
        buf.put_u32_le(self.header.dimension as u32);
        buf.put_u64_le(self.header.rows as u64);
        buf.put_u32_le(id.len() as u32);
        buf.put_slice(id);
        for &x in &self.data {
            buf.put_f32_le(x);
        }
        buf
    }

    /// Parse the header only
    pub fn decode_header(label: &str, mut bytes: &[u8]) -> Result<IndexHeader> {
        let corrupt = |reason: &str| RagError::IndexCorrupt {
            path: label.to_string(),
            reason: reason.to_string(),
        };

        if bytes.remaining() < FIXED_HEADER_LEN {
            return Err(corrupt("file shorter than header"));
        }
        let mut magic = [0u8; 4];
        bytes.copy_to_slice(&mut magic);
        if &magic != INDEX_MAGIC {
            return Err(corrupt("bad magic"));
        }
        let version = bytes.get_u32_le();
        if version != INDEX_VERSION {
            return Err(corrupt(&format!("unsupported version {}", version)));
        }
        let dimension = bytes.get_u32_le() as usize;
        let rows = bytes.get_u64_le() as usize;
        let id_len = bytes.get_u32_le() as usize;
        if bytes.remaining() < id_len {
            return Err(corrupt("truncated model id"));
        }
        let model_id = String::from_utf8(bytes[..id_len].to_vec())
            .map_err(|_| corrupt("model id is not utf-8"))?;

        Ok(IndexHeader {
            dimension,
            rows,
            model_id,
        })
    }

    /// Parse a complete vector file, validating length and values
    pub fn decode(label: &str, bytes: &[u8]) -> Result<Self> {
        let header = Self::decode_header(label, bytes)?;
        let corrupt = |reason: String| RagError::IndexCorrupt {
            path: label.to_string(),
            reason,
        };

        let offset = FIXED_HEADER_LEN + header.model_id.len();
        let expected = header
            .rows
            .checked_mul(header.dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| corrupt("row count overflows".to_string()))?;
        let mut body = &bytes[offset..];
        if body.remaining() != expected {
            return Err(corrupt(format!(
                "expected {} bytes of vectors, found {}",
                expected,
                body.remaining()
            )));
        }
        if header.dimension == 0 && header.rows > 0 {
            return Err(corrupt("zero dimension".to_string()));
        }

        let mut data = Vec::with_capacity(header.rows * header.dimension);
        while body.has_remaining() {
            let x = body.get_f32_le();
            if !x.is_finite() {
                return Err(corrupt("non-finite vector component".to_string()));
            }
            data.push(x);
        }

        Ok(Self { header, data })
    }

    /// Write atomically (temp file + rename)
    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.encode())
    }

    /// Read and validate a vector file
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = read_artifact(path)?;
        Self::decode(&path.display().to_string(), &bytes)
    }

    /// Header of an existing vector file, `None` if there is no file
    pub fn read_header(path: &Path) -> Result<Option<IndexHeader>> {
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Self::decode_header(&path.display().to_string(), &bytes).map(Some)
    }
}

/// Write the metadata table atomically
pub fn write_metadata(path: &Path, entries: &[VectorIndexEntry]) -> Result<()> {
    let json = serde_json::to_vec_pretty(entries)?;
    write_atomic(path, &json)
}

/// Read and parse the metadata table
pub fn read_metadata(path: &Path) -> Result<Vec<VectorIndexEntry>> {
    let bytes = read_artifact(path)?;
    serde_json::from_slice(&bytes).map_err(|e| RagError::IndexCorrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(RagError::MissingArtifact(path.display().to_string()));
    }
    Ok(fs::read(path)?)
}

pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp = temp_path(path);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
