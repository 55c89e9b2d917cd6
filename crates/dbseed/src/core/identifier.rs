//! Identifier validation and quoting.
//!
//! Table and column names end up spliced into SQL text because identifiers
//! cannot be bound as parameters. Names are validated once before a statement
//! is rendered and every dialect quotes through [`quote_delimited`].

use crate::error::{Result, SeedError};

/// Maximum identifier length (conservative limit across databases).
/// - PostgreSQL: 63 bytes
/// - SQL Server: 128 characters
/// - MySQL: 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier for security issues.
///
/// Rejects empty identifiers, identifiers containing null bytes, and
/// identifiers exceeding the maximum length.
///
/// # Errors
///
/// Returns `SeedError::Config` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SeedError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(SeedError::Config(format!(
            "SECURITY: Identifier contains null byte (possible injection attempt): {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(SeedError::Config(format!(
            "SECURITY: Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Validate a possibly schema-qualified name (`schema.table`) part by part.
pub fn validate_schema_object(name: &str) -> Result<()> {
    name.split('.').try_for_each(validate_identifier)
}

/// Wrap a name in delimiters, doubling any closing delimiter inside it.
///
/// ```ignore
/// assert_eq!(quote_delimited("users", '"', '"'), "\"users\"");
/// assert_eq!(quote_delimited("a]b", '[', ']'), "[a]]b]");
/// ```
pub fn quote_delimited(name: &str, open: char, close: char) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push(open);
    for c in name.chars() {
        if c == close {
            escaped.push(close);
        }
        escaped.push(c);
    }
    escaped.push(close);
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identifier_rejects_empty() {
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let err = validate_identifier("users\0; DROP TABLE x").unwrap_err();
        assert!(err.to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_long_names() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long).is_err());
        assert!(validate_identifier(&"a".repeat(MAX_IDENTIFIER_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_schema_object() {
        assert!(validate_schema_object("audit.events").is_ok());
        assert!(validate_schema_object("audit.").is_err());
    }

    #[test]
    fn test_quote_delimited() {
        assert_eq!(quote_delimited("users", '"', '"'), "\"users\"");
        assert_eq!(quote_delimited("ta\"ble", '"', '"'), "\"ta\"\"ble\"");
        assert_eq!(quote_delimited("a]b", '[', ']'), "[a]]b]");
        assert_eq!(quote_delimited("a`b", '`', '`'), "`a``b`");
    }
}
