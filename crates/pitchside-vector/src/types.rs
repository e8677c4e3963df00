//! Data types exchanged with backends and callers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::{MATCH_ID_FIELD, TEXT_FIELD};
use crate::identity::MatchKey;

/// Payload attached to a point.
pub type Payload = Map<String, Value>;

/// A document to index: prose plus the metadata it is filtered by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Text that is embedded and stored under the `text` payload key.
    pub text: String,
    /// Metadata copied into the payload; must carry `match_id`.
    #[serde(default)]
    pub metadata: Payload,
}

impl Document {
    /// Creates a document.
    pub fn new(text: impl Into<String>, metadata: Payload) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    /// Returns the match key, if the metadata carries a usable one.
    pub fn match_key(&self) -> Option<MatchKey> {
        self.metadata.get(MATCH_ID_FIELD).and_then(MatchKey::from_value)
    }

    /// Builds the stored payload: metadata plus the reserved `text` key.
    pub fn to_payload(&self) -> Payload {
        let mut payload = self.metadata.clone();
        payload.insert(TEXT_FIELD.to_owned(), Value::String(self.text.clone()));
        payload
    }

    /// Returns a short preview of the text for log lines.
    pub fn preview(&self) -> String {
        self.text.chars().take(50).collect()
    }
}

/// Unit of storage in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Deterministic point identifier.
    pub id: Uuid,
    /// Dense embedding.
    pub vector: Vec<f32>,
    /// Stored payload.
    pub payload: Payload,
}

/// Point returned by a query, normalized across call shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Point identifier in string form.
    pub id: String,
    /// Stored payload.
    pub payload: Payload,
    /// Similarity score; zero for filter-only lookups.
    pub score: f32,
}

/// Collection metadata read during bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionInfo {
    /// Payload fields that already have an index.
    pub indexed_fields: BTreeSet<String>,
}
