//! Document store error types.

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to initialize the storage operator.
    #[error("storage initialization failed: {0}")]
    Init(String),

    /// Permission denied.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Collection or key cannot be used as a path segment.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Stored bytes are not a JSON object.
    #[error("corrupt record {path}: {message}")]
    Corrupt { path: String, message: String },

    /// Record could not be encoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(opendal::Error),
}

impl StoreError {
    /// Creates a new initialization error.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Creates a new invalid path error.
    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }

    pub(crate) fn corrupt(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Corrupt {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl From<opendal::Error> for StoreError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err),
        }
    }
}
