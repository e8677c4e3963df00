//! User question response types.

use pitchside_vector::SearchResults;
use serde::Serialize;

/// Search hits for a match question, grouped by collection.
#[must_use]
#[derive(Debug, Clone, Serialize)]
pub struct QuestionAnswer {
    /// Canonical match identifier.
    pub match_id: String,
    /// Hits keyed by collection name.
    pub results: SearchResults,
}
