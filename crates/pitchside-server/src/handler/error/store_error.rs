//! Document store error to HTTP error conversion.

use pitchside_opendal::StoreError;

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for store error conversions.
const TRACING_TARGET: &str = "pitchside_server::handler::store";

impl From<StoreError> for HttpError<'static> {
    fn from(error: StoreError) -> Self {
        tracing::error!(
            target: TRACING_TARGET,
            error = %error,
            "Document store operation failed"
        );

        match error {
            StoreError::InvalidPath(_) => ErrorKind::BadRequest
                .with_message("Invalid record key")
                .with_context(error.to_string()),
            _ => ErrorKind::InternalServerError.with_message("Document store operation failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_is_bad_request() {
        let error = HttpError::from(StoreError::invalid_path("key '..' is not valid"));
        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }
}
