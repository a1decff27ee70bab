//! Identifier validation and literal quoting for generated catalog queries.
//!
//! Some catalog queries compare against table, column and index names that
//! cannot be bound as parameters (the number of joined index-column tables
//! depends on the input). Those names are validated and embedded as quoted
//! string literals.

use crate::error::{DbmsError, Result};

/// Maximum identifier length (conservative limit across databases).
/// - Oracle: 128 bytes (12.2+)
/// - SQL Server: 128 characters
/// - PostgreSQL: 63 bytes
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier before embedding it in SQL text.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers exceeding the maximum length.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DbmsError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DbmsError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DbmsError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Escape a value for use inside a single-quoted SQL literal.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Quote an identifier as a string literal, e.g. for `WHERE table_name = 'T'`.
///
/// Validates the identifier before quoting.
pub fn quote_literal(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("'{}'", escape_literal(name)))
}
