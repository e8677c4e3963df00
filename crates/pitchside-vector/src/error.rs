//! Error types for vector store operations.
//!
//! Backend adapters inspect the raw transport error exactly once and classify
//! it into a [`BackendErrorKind`]. Everything above the adapter branches on the
//! kind and never on message text.

use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Result type for crate-level operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Closed set of outcomes a backend failure is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BackendErrorKind {
    /// The collection or point does not exist.
    NotFound,
    /// The credential was rejected (HTTP 403 / gRPC permission denied).
    Forbidden,
    /// The collection or payload index already exists.
    AlreadyExists,
    /// Client and server disagree on the request shape.
    SchemaMismatch,
    /// Any other transport or server failure.
    Other,
}

/// A classified backend failure.
#[derive(Debug, Error)]
#[error("{}: {message}", kind.as_ref())]
pub struct BackendError {
    kind: BackendErrorKind,
    message: String,
    #[source]
    source: Option<BoxedError>,
}

impl BackendError {
    /// Creates a new error of the given kind.
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the underlying transport error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Forbidden, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::AlreadyExists, message)
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::SchemaMismatch, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Other, message)
    }

    /// Returns the classified kind.
    #[inline]
    pub fn kind(&self) -> BackendErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        self.kind == BackendErrorKind::NotFound
    }

    #[inline]
    pub fn is_forbidden(&self) -> bool {
        self.kind == BackendErrorKind::Forbidden
    }

    #[inline]
    pub fn is_already_exists(&self) -> bool {
        self.kind == BackendErrorKind::AlreadyExists
    }

    #[inline]
    pub fn is_schema_mismatch(&self) -> bool {
        self.kind == BackendErrorKind::SchemaMismatch
    }
}

/// Failure reported by an [`Embedder`].
///
/// [`Embedder`]: crate::Embedder
#[derive(Debug, Error)]
#[error("embedding failed: {message}")]
pub struct EmbeddingError {
    message: String,
    #[source]
    source: Option<BoxedError>,
}

impl EmbeddingError {
    /// Creates a new embedding error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the provider error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Crate-level errors raised while constructing components.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not build or reach the backend.
    #[error("connection error: {0}")]
    Connection(String),

    /// Classified backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl VectorError {
    /// Creates an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_display_uses_kind() {
        let error = BackendError::not_found("collection `match_stats`");
        assert_eq!(error.to_string(), "not_found: collection `match_stats`");
        assert!(error.is_not_found());
        assert!(!error.is_forbidden());
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::other("socket closed");
        let error = BackendError::other("upsert failed").with_source(io);
        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(error.kind(), BackendErrorKind::Other);
    }
}
