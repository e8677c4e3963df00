//! User question request types.

use pitchside_vector::MatchKey;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::validations::{match_key_not_blank, not_blank};

/// Request payload for a question about one match.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UserQuestion {
    /// Match the question is about; numbers and numeric strings are equivalent.
    #[validate(required(message = "match_id is required"))]
    #[validate(custom(function = "match_key_not_blank"))]
    #[serde(default)]
    pub match_id: Option<MatchKey>,

    /// Free-text question.
    #[validate(custom(function = "not_blank"))]
    #[serde(default)]
    pub question: String,
}
