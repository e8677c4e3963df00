//! Payload index planning.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::config::{IdentifierStorage, IndexConfig, MATCH_ID_FIELD, TEXT_FIELD};

/// Short categorical codes that are matched exactly.
const EXACT_FIELDS: &[&str] = &["home_team", "away_team", "match_format", "position"];

/// Free-text fields that do not follow the `*_name` convention.
const TEXT_FIELDS: &[&str] = &["ground_name", "full_name", "league_name", TEXT_FIELD];

/// Identifier fields listed explicitly in addition to the `*_id` suffix rule.
const ID_FIELDS: &[&str] = &[MATCH_ID_FIELD, "venue_id", "player_id"];

/// Kind of payload index created for a field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, AsRefStr, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SchemaKind {
    /// Exact keyword match.
    Exact,
    /// Full-text match.
    Text,
    /// Exact integer match.
    Integer,
}

impl From<IdentifierStorage> for SchemaKind {
    fn from(storage: IdentifierStorage) -> Self {
        match storage {
            IdentifierStorage::Integer => Self::Integer,
            IdentifierStorage::Keyword => Self::Exact,
        }
    }
}

/// Decides which payload indexes a collection needs.
#[derive(Debug, Clone)]
pub struct SchemaPlanner {
    config: IndexConfig,
}

impl SchemaPlanner {
    /// Creates a planner over the given layout.
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    /// Returns the layout this planner reads from.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Returns the index schema for a payload field.
    pub fn schema_for(&self, field: &str) -> SchemaKind {
        let field = field.to_ascii_lowercase();

        if ID_FIELDS.contains(&field.as_str()) || field.ends_with("_id") {
            return self.config.identifier_storage.into();
        }

        if EXACT_FIELDS.contains(&field.as_str()) {
            return SchemaKind::Exact;
        }

        if field.ends_with("_name") || TEXT_FIELDS.contains(&field.as_str()) {
            return SchemaKind::Text;
        }

        SchemaKind::Text
    }

    /// Returns every field that must be indexed in a collection.
    ///
    /// Always contains [`TEXT_FIELD`]; unknown collections plan only that.
    pub fn fields_for(&self, collection: &str) -> BTreeSet<String> {
        let mut fields: BTreeSet<String> = self
            .config
            .fields(collection)
            .unwrap_or_default()
            .iter()
            .cloned()
            .collect();
        fields.insert(TEXT_FIELD.to_owned());
        fields
    }

    /// Returns `(field, schema)` pairs for a collection.
    pub fn plan(&self, collection: &str) -> Vec<(String, SchemaKind)> {
        self.fields_for(collection)
            .into_iter()
            .map(|field| {
                let schema = self.schema_for(&field);
                (field, schema)
            })
            .collect()
    }
}
