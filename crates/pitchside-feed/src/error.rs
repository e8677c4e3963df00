//! Error types for the fixture feeds.

/// Result type alias for feed operations.
pub type FeedResult<T, E = FeedError> = std::result::Result<T, E>;

/// Error type for feed operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed or returned an error status.
    #[error("http error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Response was JSON but not in the expected shape.
    #[error("unexpected payload: {0}")]
    Payload(String),

    /// Feed is not reachable.
    #[error("feed unavailable: {0}")]
    Unavailable(String),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FeedError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an unexpected-payload error.
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    /// Creates an unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Returns true if the request timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Reqwest(e) if e.is_timeout())
    }
}
