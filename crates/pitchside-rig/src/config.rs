//! Provider configuration.

#[cfg(feature = "config")]
use clap::Args;
use pitchside_vector::config::DEFAULT_VECTOR_DIM;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default embedding model (all-MiniLM-L6-v2 as packaged by Ollama).
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// Default completion model for summaries.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

/// Embedding backend.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString
)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmbeddingProviderKind {
    /// Local Ollama server.
    #[default]
    Ollama,
    /// OpenAI embeddings API.
    #[cfg_attr(feature = "config", value(name = "openai"))]
    #[serde(rename = "openai")]
    #[strum(serialize = "openai")]
    OpenAi,
}

/// Embedding model settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct EmbeddingConfig {
    /// Embedding backend.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "EMBEDDING_PROVIDER", value_enum, default_value_t = EmbeddingProviderKind::Ollama)
    )]
    #[serde(default)]
    pub embedding_provider: EmbeddingProviderKind,

    /// Embedding model name.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)
    )]
    pub embedding_model: String,

    /// Dimensionality of the produced vectors.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "EMBEDDING_DIM", default_value_t = DEFAULT_VECTOR_DIM)
    )]
    pub embedding_dim: usize,

    /// Ollama base URL.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "OLLAMA_BASE_URL", default_value = DEFAULT_OLLAMA_BASE_URL)
    )]
    pub ollama_base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            embedding_provider: EmbeddingProviderKind::Ollama,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_owned(),
            embedding_dim: DEFAULT_VECTOR_DIM,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_owned(),
        }
    }
}

impl EmbeddingConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.embedding_model.trim().is_empty() {
            return Err(Error::config("embedding model cannot be empty"));
        }

        if self.embedding_dim == 0 {
            return Err(Error::config("embedding dimension must be positive"));
        }

        if self.embedding_provider == EmbeddingProviderKind::Ollama
            && !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://")
        {
            return Err(Error::config(
                "Ollama base URL must start with http:// or https://",
            ));
        }

        Ok(())
    }
}

/// Completion model settings for summaries.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct CompletionConfig {
    /// OpenAI API key, shared with OpenAI embeddings.
    #[cfg_attr(feature = "config", arg(long, env = "OPENAI_API_KEY"))]
    #[serde(default, skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Completion model name.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "COMPLETION_MODEL", default_value = DEFAULT_COMPLETION_MODEL)
    )]
    pub completion_model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            completion_model: DEFAULT_COMPLETION_MODEL.to_owned(),
        }
    }
}

impl CompletionConfig {
    /// Returns the API key, treating blank values as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.completion_model.trim().is_empty() {
            return Err(Error::config("completion model cannot be empty"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("completion_model", &self.completion_model)
            .finish()
    }
}
