//! Request validation utilities.

use pitchside_vector::MatchKey;
use validator::ValidationError;

pub fn validation_error(code: &'static str, message: &str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.to_string().into());
    error
}

/// Rejects empty and whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(validation_error("blank", "Value cannot be blank"));
    }

    Ok(())
}

/// Rejects blank textual match identifiers.
pub fn match_key_not_blank(key: &MatchKey) -> Result<(), ValidationError> {
    match key {
        MatchKey::Integer(_) => Ok(()),
        MatchKey::Text(text) => not_blank(text),
    }
}
