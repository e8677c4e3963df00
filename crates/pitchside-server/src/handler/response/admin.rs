//! Admin response types.

use pitchside_opendal::UpsertStatus;
use serde::{Deserialize, Serialize};

/// Result of storing a summary style guide.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionStored {
    /// Whether the guide was created or replaced.
    pub status: UpsertStatus,
    /// Guide identifier.
    pub description_type: String,
}
