//! Shared fixtures: a small PostgreSQL corpus indexed with the hashing embedder

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use docqa::chunking::{Chunker, ChunkingConfig, WhitespaceTokenizer};
use docqa::embedding::{Embedder, HashingEmbedder};
use docqa::errors::{RagError, Result};
use docqa::generation::Generator;
use docqa::index::IndexBuilder;
use docqa::rag::Retriever;
use docqa::types::{Chunk, Document, Section};
use docqa::VectorStore;

pub const BASE_URL: &str = "https://www.postgresql.org/docs/16";

pub fn document(name: &str, sections: &[(&str, &str)]) -> Document {
    Document {
        doc_name: name.to_string(),
        url: format!("{}/{}.html", BASE_URL, name),
        sections: sections
            .iter()
            .map(|(title, text)| Section {
                title: title.to_string(),
                text: text.to_string(),
            })
            .collect(),
    }
}

pub fn corpus() -> Vec<Document> {
    vec![
        document(
            "sql-createindex",
            &[(
                "Description",
                "CREATE INDEX constructs an index on the specified column of a table.",
            )],
        ),
        document(
            "sql-insert",
            &[
                ("Synopsis", "   "),
                ("Description", "INSERT inserts new rows into a table."),
            ],
        ),
        document(
            "sql-select",
            &[("Description", "SELECT retrieves rows from zero or more tables.")],
        ),
        document(
            "sql-vacuum",
            &[("Description", "VACUUM reclaims storage occupied by dead tuples.")],
        ),
    ]
}

pub fn chunk_corpus(documents: &[Document]) -> Vec<Chunk> {
    let chunker = Chunker::new(ChunkingConfig::default(), Arc::new(WhitespaceTokenizer)).unwrap();
    chunker.chunk_corpus(documents).unwrap()
}

/// Index snapshot on disk plus the paths to reopen it
pub struct Fixture {
    pub dir: TempDir,
    pub chunks: Vec<Chunk>,
    pub index_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl Fixture {
    pub async fn build() -> Self {
        let dir = TempDir::new().unwrap();
        let index_path = dir.path().join("embeddings").join("index.bin");
        let metadata_path = dir.path().join("embeddings").join("metadata.json");
        let chunks = chunk_corpus(&corpus());

        IndexBuilder::new(embedder(), 2)
            .build_to(&chunks, &index_path, &metadata_path, |_| {})
            .await
            .unwrap();

        Self {
            dir,
            chunks,
            index_path,
            metadata_path,
        }
    }

    pub fn store(&self) -> Arc<VectorStore> {
        Arc::new(VectorStore::open(&self.index_path, &self.metadata_path).unwrap())
    }

    pub fn retriever(&self) -> Arc<Retriever> {
        Arc::new(Retriever::new(self.store(), embedder()).unwrap())
    }
}

pub fn embedder() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::default())
}

/// Records prompts and replies with a fixed answer
#[derive(Default)]
pub struct ScriptedGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_user_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> String {
        "scripted".to_string()
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));
        Ok(self.reply.clone())
    }
}

/// Always fails with a transient backend error
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> String {
        "failing".to_string()
    }

    async fn generate(&self, _: &str, _: &str) -> Result<String> {
        Err(RagError::Generation {
            message: "HTTP 503 Service Unavailable".to_string(),
            retryable: true,
        })
    }
}

/// Never answers within any reasonable timeout
pub struct StalledGenerator;

#[async_trait]
impl Generator for StalledGenerator {
    fn name(&self) -> String {
        "stalled".to_string()
    }

    async fn generate(&self, _: &str, _: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("too late".to_string())
    }
}

/// Hashing embedder that holds its thread for a while on every call
pub struct SlowEmbedder {
    pub inner: HashingEmbedder,
    pub delay: Duration,
}

impl Embedder for SlowEmbedder {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        std::thread::sleep(self.delay);
        self.inner.embed_batch(texts)
    }
}
