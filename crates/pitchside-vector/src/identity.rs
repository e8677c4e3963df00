//! Deterministic point identity.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// External match identifier as it appears in fixture payloads.
///
/// Feeds are inconsistent about whether identifiers are numbers or strings,
/// so both are accepted. The [`Display`] form is the canonical key: `123` and
/// `"123"` render identically and therefore map to the same point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchKey {
    /// Numeric identifier.
    #[display("{_0}")]
    Integer(i64),
    /// String identifier.
    #[display("{_0}")]
    Text(String),
}

impl From<i64> for MatchKey {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<String> for MatchKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MatchKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl MatchKey {
    /// Reads a key from a JSON payload value.
    ///
    /// Returns `None` for null, booleans, containers, blank strings,
    /// non-integral floats and floats outside the `i64` range. Strings are
    /// kept verbatim, so `" 77 "` and `"77"` are different keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole_f64_to_i64))
                .map(Self::Integer),
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    /// Returns the integer form, parsing string keys when they are numeric.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Text(s) => s.parse().ok(),
        }
    }

    /// Derives the point identifier for this key.
    #[inline]
    pub fn point_id(&self) -> Uuid {
        point_id(self)
    }
}

/// Converts a whole float to `i64` without saturating.
fn whole_f64_to_i64(f: f64) -> Option<i64> {
    // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}

/// Derives the vector-store point id for a match.
///
/// UUIDv5 over the DNS namespace with the canonical string form of the key as
/// the name. Pure: the same key yields the same id in every process.
pub fn point_id(key: &MatchKey) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, key.to_string().as_bytes())
}
