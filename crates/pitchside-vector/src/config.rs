//! Index configuration shared by the bootstrapper, upserter and searcher.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{VectorError, VectorResult};

/// Default embedding dimensionality (all-MiniLM-L6-v2).
pub const DEFAULT_VECTOR_DIM: usize = 384;

/// Payload key that always holds the original document text.
pub const TEXT_FIELD: &str = "text";

/// Payload key holding the external match identifier.
pub const MATCH_ID_FIELD: &str = "match_id";

/// Collection holding match detail summaries.
pub const MATCH_DETAILS_COLLECTION: &str = "match_details";

/// Collection holding match statistics summaries.
pub const MATCH_STATS_COLLECTION: &str = "match_stats";

const MATCH_STATS_FIELDS: &[&str] = &[
    "match_id",
    "away_team_id",
    "away_team",
    "away_team_name",
    "home_team",
    "home_team_id",
    "home_team_name",
    "league_id",
    "league_name",
    "ground_name",
    "match_format",
    "venue_id",
];

const MATCH_DETAILS_EXTRA_FIELDS: &[&str] = &["player_id", "full_name", "position"];

/// How identifier fields are stored in point payloads.
///
/// This is one deployment-wide switch. It decides the index schema of every
/// identifier field and the value type of `match_id` filters, so it must agree
/// with the payloads actually written.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString
)]
#[cfg_attr(feature = "config", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IdentifierStorage {
    /// Identifiers are JSON numbers and indexed as integers.
    #[default]
    Integer,
    /// Identifiers are JSON strings and indexed as exact keywords.
    Keyword,
}

/// Vector similarity metric.
///
/// Collections are always created with cosine similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    /// Cosine similarity.
    #[default]
    Cosine,
}

/// Per-deployment index layout.
///
/// Constructed once at startup and handed to every component; nothing in this
/// crate reads settings from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "config does nothing unless you use it"]
pub struct IndexConfig {
    /// Dimensionality of stored vectors.
    pub vector_dim: usize,
    /// Similarity metric for new collections.
    #[serde(default)]
    pub distance: Distance,
    /// Storage convention for identifier fields.
    #[serde(default)]
    pub identifier_storage: IdentifierStorage,
    /// Payload fields to index, keyed by collection name.
    pub collections: BTreeMap<String, Vec<String>>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::cricket(MATCH_DETAILS_COLLECTION, MATCH_STATS_COLLECTION)
    }
}

impl IndexConfig {
    /// Creates an empty configuration with the given vector dimensionality.
    pub fn new(vector_dim: usize) -> Self {
        Self {
            vector_dim,
            distance: Distance::Cosine,
            identifier_storage: IdentifierStorage::default(),
            collections: BTreeMap::new(),
        }
    }

    /// Creates the built-in cricket layout under the given collection names.
    pub fn cricket(details: impl Into<String>, stats: impl Into<String>) -> Self {
        let stats_fields: Vec<String> = MATCH_STATS_FIELDS.iter().map(|f| f.to_string()).collect();
        let details_fields: Vec<String> = stats_fields
            .iter()
            .cloned()
            .chain(MATCH_DETAILS_EXTRA_FIELDS.iter().map(|f| f.to_string()))
            .collect();

        Self::new(DEFAULT_VECTOR_DIM)
            .with_collection(details, details_fields)
            .with_collection(stats, stats_fields)
    }

    /// Registers a collection and its indexed fields.
    pub fn with_collection(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.collections
            .insert(name.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the vector dimensionality.
    pub fn with_vector_dim(mut self, vector_dim: usize) -> Self {
        self.vector_dim = vector_dim;
        self
    }

    /// Sets the identifier storage convention.
    pub fn with_identifier_storage(mut self, storage: IdentifierStorage) -> Self {
        self.identifier_storage = storage;
        self
    }

    /// Returns the configured fields of a collection.
    pub fn fields(&self, collection: &str) -> Option<&[String]> {
        self.collections.get(collection).map(Vec::as_slice)
    }

    /// Returns the configured collection names in order.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VectorResult<()> {
        if self.vector_dim == 0 {
            return Err(VectorError::invalid_config("vector dimension must be positive"));
        }

        if let Some(name) = self.collections.keys().find(|name| name.trim().is_empty()) {
            return Err(VectorError::invalid_config(format!(
                "collection name {name:?} is blank"
            )));
        }

        Ok(())
    }
}
