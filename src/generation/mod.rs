//! Answer generation backends
//!
//! The pipeline treats generation as an opaque `(system, user) → text` call.
//! Two HTTP backends ship: a local Ollama server and an OpenAI-compatible
//! chat completions endpoint. Neither streams; answers arrive whole.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAiGenerator;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{RagError, Result};

/// Default generation timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Produces an answer from a prompt pair
#[async_trait]
pub trait Generator: Send + Sync {
    /// Backend/model label for logs
    fn name(&self) -> String;

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Which backend to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    Openai,
    Ollama,
}

impl Provider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Openai => openai::DEFAULT_OPENAI_URL,
            Provider::Ollama => ollama::DEFAULT_OLLAMA_URL,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Openai => openai::DEFAULT_OPENAI_MODEL,
            Provider::Ollama => ollama::DEFAULT_OLLAMA_MODEL,
        }
    }
}

/// Generation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: Provider,
    /// Server URL; the provider's default when unset
    pub base_url: Option<String>,
    /// Model name; the provider's default when unset
    pub model: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Environment variable holding the API key (openai only)
    pub api_key_env: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            model: None,
            temperature: 0.0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl GenerationConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "generation timeout_secs must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::ConfigError(format!(
                "generation temperature must be within [0, 2], got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}

/// Construct the configured generator
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    config.validate()?;
    match config.provider {
        Provider::Openai => Ok(Arc::new(OpenAiGenerator::from_config(config)?)),
        Provider::Ollama => Ok(Arc::new(OllamaGenerator::from_config(config)?)),
    }
}

/// Map a non-success HTTP status to an error
///
/// 429 is a rate limit; 5xx and 408 may succeed on retry; other statuses
/// (bad key, unknown model) will not.
pub(crate) fn status_error(status: StatusCode, body: &str) -> RagError {
    let message = format!("HTTP {}: {}", status, body.trim());
    if status == StatusCode::TOO_MANY_REQUESTS {
        return RagError::RateLimited(message);
    }
    RagError::Generation {
        message,
        retryable: status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT,
    }
}

/// Chat message on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireMessage {
    pub role: String,
    pub content: String,
}

pub(crate) fn wire_messages(system_prompt: &str, user_prompt: &str) -> Vec<WireMessage> {
    vec![
        WireMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        },
        WireMessage {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        },
    ]
}
