//! Conversion of stored match records into indexable documents.

use pitchside_opendal::Record;
use pitchside_vector::{Document, Payload, SchemaKind, SchemaPlanner};
use serde_json::Value;

/// Record keys copied into document metadata. Absent keys are omitted.
const METADATA_FIELDS: &[&str] = &[
    "match_id",
    "away_team",
    "away_team_id",
    "away_team_name",
    "ground_name",
    "home_team",
    "home_team_id",
    "home_team_name",
    "league_id",
    "league_name",
    "match_format",
    "match_title",
    "match_scheduled_date",
    "venue_id",
];

/// Builds the document for a stored record.
///
/// Returns `None` when the record has no usable summary under
/// `summary_field`.
pub fn build_document(
    record: &Record,
    summary_field: &str,
    planner: &SchemaPlanner,
) -> Option<Document> {
    let summary = record
        .get(summary_field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|summary| !summary.is_empty())?;

    let mut metadata = Payload::new();
    for field in METADATA_FIELDS {
        if let Some(value) = record.get(*field).filter(|v| !v.is_null()) {
            metadata.insert((*field).to_owned(), value.clone());
        }
    }

    coerce_identifiers(&mut metadata, planner);
    Some(Document::new(summary, metadata))
}

/// Aligns metadata value types with the index schema of each field.
///
/// Integer-indexed fields turn numeric strings into numbers; keyword-indexed
/// fields turn integers into strings. Values that cannot be converted,
/// padded strings included, are left as they are.
pub fn coerce_identifiers(metadata: &mut Payload, planner: &SchemaPlanner) {
    for (field, value) in metadata.iter_mut() {
        match (planner.schema_for(field), &*value) {
            (SchemaKind::Integer, Value::String(text)) => {
                if let Ok(number) = text.parse::<i64>() {
                    *value = Value::from(number);
                }
            }
            (SchemaKind::Exact, Value::Number(number)) => {
                if let Some(number) = number.as_i64() {
                    *value = Value::String(number.to_string());
                }
            }
            _ => {}
        }
    }
}
