//! Request extractors with structured rejections.
//!
//! - [`Json`] deserializes a body and reports malformed input as a
//!   `bad_request` error body instead of axum's plain-text rejection.
//! - [`ValidateJson`] additionally runs the `validator` rules declared on
//!   the request type.

mod json;
mod validated_json;

pub use self::json::Json;
pub use self::validated_json::ValidateJson;
