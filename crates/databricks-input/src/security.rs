//! Identifier safety for statements built from configuration.
//!
//! Catalog, schema and table names come straight from user configuration and
//! are spliced into `USE CATALOG` / `USE SCHEMA` / `SELECT` text, so they are
//! validated and then always emitted backtick-quoted.

use crate::error::Error;

/// Maximum identifier length accepted by the warehouse
pub const MAX_IDENTIFIER_LEN: usize = 255;

/// Validate an identifier taken from configuration.
///
/// - Must not be empty
/// - Maximum 255 characters
/// - Must not contain control characters (NUL, newline, ...)
///
/// Any other character is allowed; [`quote_identifier`] makes it inert.
///
/// # Examples
///
/// ```
/// use databricks_input::security::validate_identifier;
///
/// assert!(validate_identifier("main").is_ok());
/// assert!(validate_identifier("my-catalog").is_ok());
/// assert!(validate_identifier("").is_err());
/// assert!(validate_identifier("a\nb").is_err());
/// ```
pub fn validate_identifier(name: &str) -> crate::Result<()> {
    if name.is_empty() {
        return Err(Error::config("identifier cannot be empty"));
    }

    let len = name.chars().count();
    if len > MAX_IDENTIFIER_LEN {
        return Err(Error::config(format!(
            "identifier too long: {} chars (max {})",
            len, MAX_IDENTIFIER_LEN
        )));
    }

    if let Some(c) = name.chars().find(|c| c.is_control()) {
        return Err(Error::config(format!(
            "invalid identifier {:?}: contains control character {:?}",
            name, c
        )));
    }

    Ok(())
}

/// Quote an identifier with backticks, doubling embedded backticks.
///
/// # Examples
///
/// ```
/// use databricks_input::security::quote_identifier;
///
/// assert_eq!(quote_identifier("main"), "`main`");
/// assert_eq!(quote_identifier("a`b"), "`a``b`");
/// assert_eq!(quote_identifier("x`; DROP SCHEMA s; --"), "`x``; DROP SCHEMA s; --`");
/// ```
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        if c == '`' {
            quoted.push('`');
        }
        quoted.push(c);
    }
    quoted.push('`');
    quoted
}

/// Validate and quote in one step
pub fn quote_validated(name: &str) -> crate::Result<String> {
    validate_identifier(name)?;
    Ok(quote_identifier(name))
}
