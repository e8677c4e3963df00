//! Search failures.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use thiserror::Error;

use crate::error::{BackendError, EmbeddingError};

/// Where a credential rejection was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ForbiddenStage {
    /// The connect-time collection listing.
    SelfTest,
    /// A query against a collection.
    Query,
}

/// The vector store rejected the credential.
///
/// Carries remediation hints so the HTTP layer can return them verbatim.
#[derive(Debug, Error)]
#[error("vector store rejected the credential during {stage}: {message}")]
pub struct ForbiddenError {
    stage: ForbiddenStage,
    collection: Option<String>,
    message: String,
    hints: Vec<String>,
    #[source]
    source: BackendError,
}

impl ForbiddenError {
    pub(crate) fn new(
        stage: ForbiddenStage,
        collection: Option<&str>,
        source: BackendError,
    ) -> Self {
        let mut hints = vec![
            "Check that the vector store URL uses the scheme and port the cluster expects."
                .to_owned(),
            "Check that QDRANT_API_KEY is set and valid for this cluster.".to_owned(),
        ];

        match collection {
            Some(collection) => hints.push(format!(
                "Check that collection '{collection}' exists and the key may read it."
            )),
            None => hints.push(
                "Check that the configured collections exist and the key may read them."
                    .to_owned(),
            ),
        }

        hints.push("Check that this host is on the cluster's network allow-list.".to_owned());

        Self {
            stage,
            collection: collection.map(str::to_owned),
            message: source.message().to_owned(),
            hints,
            source,
        }
    }

    /// Returns where the rejection happened.
    pub fn stage(&self) -> ForbiddenStage {
        self.stage
    }

    /// Returns the collection being queried, if any.
    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Returns the backend message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns remediation hints.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }
}

/// Errors returned by [`Searcher`].
///
/// [`Searcher`]: super::Searcher
#[derive(Debug, Error)]
pub enum SearchError {
    /// The credential was rejected.
    #[error(transparent)]
    Forbidden(#[from] ForbiddenError),

    /// The connect-time self-test failed for another reason.
    #[error("searcher initialization failed: {0}")]
    Initialization(#[source] BackendError),

    /// The question could not be embedded.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}

impl SearchError {
    /// Returns the forbidden details, if this is a credential rejection.
    pub fn as_forbidden(&self) -> Option<&ForbiddenError> {
        match self {
            Self::Forbidden(err) => Some(err),
            _ => None,
        }
    }
}
