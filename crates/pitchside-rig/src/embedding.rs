//! Rig-backed [`Embedder`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use pitchside_vector::{Embedder, EmbeddingError};
use rig::client::Nothing;
use rig::embeddings::{EmbeddingError as RigEmbeddingError, EmbeddingModel as RigEmbeddingModel};
use rig::prelude::EmbeddingsClient;
use rig::providers::{ollama, openai};

use crate::TRACING_TARGET_EMBEDDING;
use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::{Error, Result};

/// Embedding model behind a rig provider.
///
/// This is a cheaply cloneable wrapper around an `Arc<EmbeddingService>`.
#[derive(Clone)]
pub struct RigEmbedder(Arc<EmbeddingService>);

enum EmbeddingService {
    Ollama {
        model: ollama::EmbeddingModel<reqwest::Client>,
        model_name: String,
    },
    OpenAi {
        model: openai::EmbeddingModel,
        model_name: String,
    },
}

impl RigEmbedder {
    /// Builds the configured provider.
    ///
    /// `openai_api_key` is only read for the OpenAI provider.
    pub fn connect(config: &EmbeddingConfig, openai_api_key: Option<&str>) -> Result<Self> {
        config.validate()?;

        let service = match config.embedding_provider {
            EmbeddingProviderKind::Ollama => {
                let client = ollama::Client::builder()
                    .api_key(Nothing)
                    .base_url(&config.ollama_base_url)
                    .build()
                    .map_err(|e| Error::provider("ollama", e))?;

                EmbeddingService::Ollama {
                    model: ollama::EmbeddingModel::new(
                        client,
                        &config.embedding_model,
                        config.embedding_dim,
                    ),
                    model_name: config.embedding_model.clone(),
                }
            }
            EmbeddingProviderKind::OpenAi => {
                let api_key = openai_api_key
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| Error::config("OPENAI_API_KEY is required for OpenAI embeddings"))?;
                let client =
                    openai::Client::new(api_key).map_err(|e| Error::provider("openai", e))?;

                EmbeddingService::OpenAi {
                    model: client
                        .embedding_model_with_ndims(&config.embedding_model, config.embedding_dim),
                    model_name: config.embedding_model.clone(),
                }
            }
        };

        tracing::info!(
            target: TRACING_TARGET_EMBEDDING,
            provider = %config.embedding_provider,
            model = %config.embedding_model,
            ndims = config.embedding_dim,
            "Embedding provider ready"
        );

        Ok(Self(Arc::new(service)))
    }

    /// Returns the provider name.
    pub fn provider_name(&self) -> &'static str {
        match self.0.as_ref() {
            EmbeddingService::Ollama { .. } => "ollama",
            EmbeddingService::OpenAi { .. } => "openai",
        }
    }

    async fn embed_f64(&self, text: &str) -> std::result::Result<Vec<f64>, RigEmbeddingError> {
        let embedding = match self.0.as_ref() {
            EmbeddingService::Ollama { model, .. } => model.embed_text(text).await,
            EmbeddingService::OpenAi { model, .. } => model.embed_text(text).await,
        };
        embedding.map(|e| e.vec)
    }
}

#[async_trait]
impl Embedder for RigEmbedder {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
        let vector = self.embed_f64(text).await.map_err(|err| {
            tracing::error!(
                target: TRACING_TARGET_EMBEDDING,
                provider = self.provider_name(),
                model = self.model_name(),
                error = %err,
                "Embedding request failed"
            );
            EmbeddingError::new(format!("{} request failed", self.provider_name())).with_source(err)
        })?;

        Ok(to_f32(vector))
    }

    fn model_name(&self) -> &str {
        match self.0.as_ref() {
            EmbeddingService::Ollama { model_name, .. } => model_name,
            EmbeddingService::OpenAi { model_name, .. } => model_name,
        }
    }
}

impl std::fmt::Debug for RigEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RigEmbedder")
            .field("provider", &self.provider_name())
            .field("model", &self.model_name())
            .finish()
    }
}

fn to_f32(vector: Vec<f64>) -> Vec<f32> {
    vector.into_iter().map(|x| x as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_requires_key() {
        let config = EmbeddingConfig {
            embedding_provider: EmbeddingProviderKind::OpenAi,
            embedding_model: "text-embedding-3-small".into(),
            embedding_dim: 1536,
            ..EmbeddingConfig::default()
        };

        assert!(matches!(
            RigEmbedder::connect(&config, None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            RigEmbedder::connect(&config, Some("  ")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_ollama_builds_without_network() {
        let embedder = RigEmbedder::connect(&EmbeddingConfig::default(), None).unwrap();
        assert_eq!(embedder.provider_name(), "ollama");
        assert_eq!(embedder.model_name(), "all-minilm");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EmbeddingConfig {
            embedding_dim: 0,
            ..EmbeddingConfig::default()
        };
        assert!(RigEmbedder::connect(&config, None).is_err());
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_source() {
        // Nothing listens on port 1, so the request fails without leaving the host.
        let config = EmbeddingConfig {
            ollama_base_url: "http://127.0.0.1:1".into(),
            ..EmbeddingConfig::default()
        };
        let embedder = RigEmbedder::connect(&config, None).unwrap();

        let err = embedder.embed("Who bats first?").await.unwrap_err();
        assert!(err.message().starts_with("ollama"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_vectors_are_narrowed() {
        assert_eq!(to_f32(vec![0.5, -1.0]), vec![0.5_f32, -1.0]);
    }
}
