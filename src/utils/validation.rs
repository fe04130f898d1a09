// Input validation utilities

use regex::Regex;

use crate::error::InstallError;

/// Validate an email address's local-part/domain structure.
///
/// This is a shape check, not an RFC 5321 parser: one `@`, no whitespace,
/// and a dotted domain. Good enough to catch typos before they land in the
/// users table.
pub fn validate_email(email: &str) -> Result<(), InstallError> {
    let re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_err(|e| {
        InstallError::Internal(anyhow::anyhow!("failed to compile email regex: {}", e))
    })?;

    if re.is_match(email) {
        Ok(())
    } else {
        Err(InstallError::Validation(format!(
            "invalid email address: {}",
            email
        )))
    }
}

/// Validate a SQL identifier (table name, column name, or table prefix).
///
/// Security: identifiers are the only strings the installer ever interpolates
/// into SQL text (values always go through bind parameters), so only plain
/// letters/digits/underscore names are allowed.
pub fn validate_identifier(name: &str) -> Result<(), InstallError> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| {
        InstallError::Internal(anyhow::anyhow!("failed to compile identifier regex: {}", e))
    })?;

    if name.is_empty() {
        return Err(InstallError::Validation("identifier cannot be empty".into()));
    }
    if name.len() > 64 {
        return Err(InstallError::Validation(format!(
            "identifier exceeds 64 characters: {}",
            name
        )));
    }
    if !re.is_match(name) {
        return Err(InstallError::Validation(format!(
            "invalid identifier: '{}' (letters, digits, and underscores only, must not start with a digit)",
            name
        )));
    }

    Ok(())
}

/// Backtick-quote a vetted MySQL identifier.
pub fn quote_mysql(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Double-quote a vetted PostgreSQL identifier.
pub fn quote_postgres(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("foo@example.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co.uk").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("foo").is_err());
        assert!(validate_email("foo@").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("foo@example").is_err()); // no dotted domain
        assert!(validate_email("foo bar@example.com").is_err());
    }

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("forum_").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("col_123").is_ok());
    }

    #[test]
    fn test_validate_identifier_invalid() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("123abc").is_err()); // starts with digit
        assert!(validate_identifier("my-col").is_err()); // hyphen
        assert!(validate_identifier("name; DROP TABLE users").is_err());
        assert!(validate_identifier(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_quote_mysql_escaping() {
        assert_eq!(quote_mysql("users"), "`users`");
        assert_eq!(quote_mysql("odd`name"), "`odd``name`");
    }

    #[test]
    fn test_quote_postgres_escaping() {
        assert_eq!(quote_postgres("users"), "\"users\"");
        assert_eq!(quote_postgres("odd\"name"), "\"odd\"\"name\"");
    }
}
