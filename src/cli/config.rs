//! Configuration management for docqa
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.docqa/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::chunking::ChunkingConfig;
use crate::embedding::EmbeddingConfig;
use crate::errors::{RagError, Result};
use crate::generation::GenerationConfig;
use crate::rag::{GuardConfig, PromptConfig, SearchParams};

/// Complete configuration for docqa
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: SearchParams,
    pub prompt: PromptConfig,
    pub guard: GuardConfig,
    pub generation: GenerationConfig,
    pub paths: PathsConfig,
}

/// Artifact locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory of `*.json` documents
    pub raw_docs_dir: String,
    pub chunks_path: String,
    pub index_path: String,
    pub metadata_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_docs_dir: "data/raw_docs".to_string(),
            chunks_path: "data/chunks/chunks.json".to_string(),
            index_path: "embeddings/index.bin".to_string(),
            metadata_path: "embeddings/metadata.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from ~/.docqa/config.toml if present, else built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".docqa").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.retrieval.validate()?;
        self.prompt.validate()?;
        self.generation.validate()?;

        for (name, value) in [
            ("raw_docs_dir", &self.paths.raw_docs_dir),
            ("chunks_path", &self.paths.chunks_path),
            ("index_path", &self.paths.index_path),
            ("metadata_path", &self.paths.metadata_path),
        ] {
            if value.trim().is_empty() {
                return Err(RagError::ConfigError(format!("paths.{} must not be empty", name)));
            }
        }
        if self.paths.index_path == self.paths.metadata_path {
            return Err(RagError::ConfigError(
                "paths.index_path and paths.metadata_path must differ".to_string(),
            ));
        }

        Ok(())
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RagError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    pub fn raw_docs_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.raw_docs_dir)
    }

    pub fn chunks_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.chunks_path)
    }

    pub fn index_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.index_path)
    }

    pub fn metadata_path(&self) -> PathBuf {
        Self::expand_path(&self.paths.metadata_path)
    }
}
