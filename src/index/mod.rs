//! Vector index snapshot and its builder

pub mod builder;
pub mod snapshot;

pub use builder::{BuiltIndex, IndexBuilder};
pub use snapshot::{read_metadata, write_metadata, IndexHeader, VectorIndex, INDEX_MAGIC, INDEX_VERSION};
