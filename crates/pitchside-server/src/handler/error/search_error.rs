//! Vector search error to HTTP error conversion.
//!
//! Credential rejections surface as 403 with the remediation hints attached,
//! so operators can fix the deployment from the response alone.

use pitchside_vector::SearchError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for search error conversions.
const TRACING_TARGET: &str = "pitchside_server::handler::search";

impl From<SearchError> for HttpError<'static> {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::Forbidden(forbidden) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    stage = %forbidden.stage(),
                    collection = ?forbidden.collection(),
                    error = %forbidden,
                    "Vector store rejected the credential"
                );

                let error = ErrorKind::Forbidden
                    .with_message(forbidden.message().to_owned())
                    .with_hints(forbidden.hints().to_vec());

                match forbidden.collection() {
                    Some(collection) => error.with_resource(collection.to_owned()),
                    None => error,
                }
            }
            SearchError::Embedding(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Question embedding failed"
                );

                ErrorKind::BadGateway
                    .with_message("The embedding provider failed")
                    .with_context(err.to_string())
            }
            SearchError::Initialization(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Searcher is not initialized"
                );

                ErrorKind::ServiceUnavailable
                    .with_message("The vector store is unavailable")
                    .with_context(err.to_string())
            }
        }
    }
}
