//! Service layer error types.
//!
//! Errors raised while wiring the application together: invalid
//! configuration and external services that cannot be reached at startup.
//! Request-time failures use [`handler::Error`] instead.
//!
//! [`handler::Error`]: crate::handler::Error

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// Boxed error that is `Send + Sync`.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for service layer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Category of a service layer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or inconsistent configuration.
    Config,
    /// External service could not be reached or rejected the request.
    External,
    /// External service rejected the configured credentials.
    Auth,
    /// Internal service logic error.
    Internal,
}

impl ErrorKind {
    /// Returns the error kind as a string for categorization.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::External => "external_service",
            Self::Auth => "auth",
            Self::Internal => "internal_service",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service layer error with kind, message and optional source.
#[derive(Debug, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    #[source]
    source: Option<BoxedError>,
}

impl Error {
    #[inline]
    fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a source error.
    #[inline]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind.
    #[must_use]
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message.
    #[must_use]
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Creates a new configuration error.
    #[inline]
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a new external service error.
    #[inline]
    pub fn external(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(
            ErrorKind::External,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Creates a new credentials error.
    #[inline]
    pub fn auth(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(
            ErrorKind::Auth,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// Creates a new internal service error.
    #[inline]
    pub fn internal(
        service: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::new(
            ErrorKind::Internal,
            format!("{}: {}", service.into(), message.into()),
        )
    }
}

impl From<pitchside_vector::VectorError> for Error {
    fn from(err: pitchside_vector::VectorError) -> Self {
        Error::external("qdrant", err.to_string()).with_source(err)
    }
}

impl From<pitchside_vector::SearchError> for Error {
    fn from(err: pitchside_vector::SearchError) -> Self {
        match err.as_forbidden() {
            Some(forbidden) => {
                let message = format!("{} ({})", forbidden.message(), forbidden.hints().join("; "));
                Error::auth("qdrant", message).with_source(err)
            }
            None => Error::external("qdrant", err.to_string()).with_source(err),
        }
    }
}

impl From<pitchside_rig::Error> for Error {
    fn from(err: pitchside_rig::Error) -> Self {
        match err {
            pitchside_rig::Error::Config(_) => Error::config(err.to_string()).with_source(err),
            _ => Error::external("rig", err.to_string()).with_source(err),
        }
    }
}

impl From<pitchside_feed::FeedError> for Error {
    fn from(err: pitchside_feed::FeedError) -> Self {
        match err {
            pitchside_feed::FeedError::Config(_) => Error::config(err.to_string()).with_source(err),
            _ => Error::external("feed", err.to_string()).with_source(err),
        }
    }
}

impl From<pitchside_opendal::StoreError> for Error {
    fn from(err: pitchside_opendal::StoreError) -> Self {
        Error::external("store", err.to_string()).with_source(err)
    }
}
