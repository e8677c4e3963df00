//! Response envelope used by the cron endpoints.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Code reported when an operation succeeded.
pub const RESPONSE_CODE_OK: &str = "200";

/// Code reported when the feed had no upcoming fixtures.
pub const RESPONSE_CODE_EMPTY: &str = "400";

/// Wraps cron endpoint payloads in `{responseCode, responseMessage, responseData}`.
///
/// The response code is a string and mirrors the outcome rather than the
/// HTTP status, so an empty fixture list is still delivered with `200 OK`.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Outcome code.
    pub response_code: Cow<'static, str>,
    /// Human readable outcome.
    pub response_message: Cow<'static, str>,
    /// Payload.
    pub response_data: T,
}

impl<T> ApiEnvelope<T> {
    /// Creates a successful envelope.
    pub fn ok(message: impl Into<Cow<'static, str>>, data: T) -> Self {
        Self {
            response_code: Cow::Borrowed(RESPONSE_CODE_OK),
            response_message: message.into(),
            response_data: data,
        }
    }

    /// Returns true if the envelope reports success.
    pub fn is_ok(&self) -> bool {
        self.response_code == RESPONSE_CODE_OK
    }
}

impl ApiEnvelope<EmptyData> {
    /// Creates the envelope returned when the feed has no fixtures.
    pub fn empty(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            response_code: Cow::Borrowed(RESPONSE_CODE_EMPTY),
            response_message: message.into(),
            response_data: EmptyData {},
        }
    }
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyData {}
