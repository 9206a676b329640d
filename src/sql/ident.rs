//! Identifier validation for request-supplied table, schema and column names.
//!
//! Names are always quoted by the dialect as well; validation rejects names that
//! no catalog would hold so they never reach SQL text at all.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// Longest identifier accepted by all supported engines (SQL Server allows 128).
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn identifier_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_$]*$").expect("identifier pattern compiles"))
}

/// Validate one identifier. `what` names the role for the error message ("table", "column", ...).
pub fn validate_identifier(name: &str, what: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation(format!("{} name cannot be empty", what)));
    }
    if name.chars().count() > MAX_IDENTIFIER_LEN {
        return Err(AppError::validation(format!(
            "{} name exceeds {} characters",
            what, MAX_IDENTIFIER_LEN
        )));
    }
    if !identifier_pattern().is_match(name) {
        return Err(AppError::validation(format!(
            "{} name '{}' must start with a letter or underscore and contain only letters, digits, '_' or '$'",
            what, name
        )));
    }
    Ok(())
}
