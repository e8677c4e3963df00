//! Fixture feed error to HTTP error conversion.

use super::http_error::{Error as HttpError, ErrorKind};

/// Tracing target for feed error conversions.
const TRACING_TARGET: &str = "pitchside_server::handler::feed";

impl From<pitchside_feed::FeedError> for HttpError<'static> {
    fn from(error: pitchside_feed::FeedError) -> Self {
        tracing::warn!(
            target: TRACING_TARGET,
            error = %error,
            "Fixture feed request failed"
        );

        if error.is_timeout() {
            return ErrorKind::GatewayTimeout
                .with_message("Fixture feed timed out")
                .with_resource("fixtures");
        }

        match error {
            pitchside_feed::FeedError::Config(_) => ErrorKind::InternalServerError
                .with_message("Fixture feed is misconfigured")
                .with_context(error.to_string()),
            pitchside_feed::FeedError::Unavailable(_) | pitchside_feed::FeedError::Reqwest(_) => {
                ErrorKind::BadGateway
                    .with_message("Fixture feed is unavailable")
                    .with_resource("fixtures")
                    .with_context(error.to_string())
            }
            pitchside_feed::FeedError::Payload(_) | pitchside_feed::FeedError::Serde(_) => {
                ErrorKind::BadGateway
                    .with_message("Fixture feed returned an unexpected response")
                    .with_resource("fixtures")
                    .with_context(error.to_string())
            }
        }
    }
}
