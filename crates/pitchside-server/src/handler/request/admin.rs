//! Admin request types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use super::validations::not_blank;

/// Request payload to create or replace a summary style guide.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertDescription {
    /// Guide identifier, usually `match_details` or `match_stats`.
    #[validate(custom(function = "not_blank"))]
    pub description_type: String,

    /// Guide content, merged into the stored guide key by key.
    #[serde(default)]
    pub description_data: Map<String, Value>,
}

impl UpsertDescription {
    /// Returns the trimmed guide identifier.
    pub fn description_type(&self) -> &str {
        self.description_type.trim()
    }
}
