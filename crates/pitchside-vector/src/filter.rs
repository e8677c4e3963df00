//! Structured equality filters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{IdentifierStorage, MATCH_ID_FIELD};
use crate::identity::MatchKey;

/// Typed value a filter compares against.
///
/// Comparison is type-strict: an integer payload value never equals a
/// keyword filter value, even when both render as the same digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Exact integer match.
    Integer(i64),
    /// Exact keyword match.
    Keyword(String),
}

impl FilterValue {
    /// Returns whether a payload value satisfies this filter.
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Integer(expected), Value::Number(n)) => n.as_i64() == Some(*expected),
            (Self::Keyword(expected), Value::String(s)) => s == expected,
            _ => false,
        }
    }
}

/// Single-field equality filter: `payload[field] == equals`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Payload key.
    pub field: String,
    /// Expected value.
    pub equals: FilterValue,
}

impl SearchFilter {
    /// Creates an integer equality filter.
    pub fn integer(field: impl Into<String>, value: i64) -> Self {
        Self {
            field: field.into(),
            equals: FilterValue::Integer(value),
        }
    }

    /// Creates a keyword equality filter.
    pub fn keyword(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            equals: FilterValue::Keyword(value.into()),
        }
    }

    /// Creates a `match_id` filter typed to the storage convention.
    ///
    /// Under [`IdentifierStorage::Integer`] a non-numeric key has no integer
    /// form and falls back to a keyword filter, which matches nothing in an
    /// integer-indexed collection.
    pub fn match_id(key: &MatchKey, storage: IdentifierStorage) -> Self {
        match (storage, key.as_integer()) {
            (IdentifierStorage::Integer, Some(value)) => Self::integer(MATCH_ID_FIELD, value),
            _ => Self::keyword(MATCH_ID_FIELD, key.to_string()),
        }
    }

    /// Returns whether a payload satisfies this filter.
    pub fn matches(&self, payload: &serde_json::Map<String, Value>) -> bool {
        payload
            .get(&self.field)
            .is_some_and(|value| self.equals.matches(value))
    }
}
