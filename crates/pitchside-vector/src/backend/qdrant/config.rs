//! Qdrant connection configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};

/// Default gRPC endpoint of a local Qdrant server.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default per-request timeout, in seconds.
pub const DEFAULT_QDRANT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for [`QdrantBackend`].
///
/// [`QdrantBackend`]: super::QdrantBackend
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct QdrantConfig {
    /// Qdrant gRPC URL.
    #[cfg_attr(
        feature = "config",
        arg(long = "qdrant-url", env = "QDRANT_URL", default_value = DEFAULT_QDRANT_URL)
    )]
    #[serde(default = "QdrantConfig::default_url")]
    pub qdrant_url: String,

    /// API key sent with every request.
    #[cfg_attr(feature = "config", arg(long = "qdrant-api-key", env = "QDRANT_API_KEY"))]
    #[serde(default, skip_serializing)]
    pub qdrant_api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "qdrant-timeout", env = "QDRANT_TIMEOUT", default_value_t = DEFAULT_QDRANT_TIMEOUT_SECS)
    )]
    #[serde(default = "QdrantConfig::default_timeout_secs")]
    pub qdrant_timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QDRANT_URL)
    }
}

impl QdrantConfig {
    /// Creates a configuration for the given URL with no API key.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            qdrant_timeout_secs: DEFAULT_QDRANT_TIMEOUT_SECS,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.qdrant_api_key = Some(api_key.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.qdrant_timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.qdrant_timeout_secs)
    }

    /// Returns the API key, treating blank values as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.qdrant_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VectorResult<()> {
        let url = self.qdrant_url.trim();
        if url.is_empty() {
            return Err(VectorError::invalid_config("Qdrant URL cannot be empty"));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(VectorError::invalid_config(
                "Qdrant URL must start with http:// or https://",
            ));
        }

        if self.qdrant_timeout_secs == 0 {
            return Err(VectorError::invalid_config(
                "Qdrant timeout must be at least one second",
            ));
        }

        Ok(())
    }

    fn default_url() -> String {
        DEFAULT_QDRANT_URL.to_owned()
    }

    fn default_timeout_secs() -> u64 {
        DEFAULT_QDRANT_TIMEOUT_SECS
    }
}

impl std::fmt::Debug for QdrantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantConfig")
            .field("qdrant_url", &self.qdrant_url)
            .field("qdrant_api_key", &self.qdrant_api_key.as_ref().map(|_| "***"))
            .field("qdrant_timeout_secs", &self.qdrant_timeout_secs)
            .finish()
    }
}
