// Installer error taxonomy
// Fatal kinds halt the wizard; recoverable kinds feed the bounded re-prompt loops.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    /// Database unreachable or a connection-level query failed. Fatal.
    #[error("database connection failed: {0}")]
    Connection(String),

    /// The configured users table is not present in the database. Fatal.
    #[error("no `{table}` table was found in the database")]
    MissingTable { table: String },

    /// Fewer schema files applied than expected. Fatal, after best-effort drops.
    #[error("failed to create database tables ({applied} of {total} schema files applied)")]
    SchemaApplication { applied: usize, total: usize },

    /// Username or email collision in the users table. Recoverable, re-prompt.
    #[error("{field} already exists")]
    Duplicate { field: &'static str },

    /// Malformed or missing operator input. Recoverable, re-prompt.
    #[error("{0}")]
    Validation(String),

    /// Admin user or access-grant insert failed. Recoverable, restarts the step.
    #[error("{0}")]
    Insert(String),

    /// A bounded prompt loop ran out of attempts. Fatal, clean exit.
    #[error("no valid answer after {attempts} attempts, aborting installation")]
    AttemptsExhausted { attempts: u32 },

    /// Terminal input could not be read. Fatal.
    #[error("terminal input failed: {0}")]
    Prompt(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<std::io::Error> for InstallError {
    fn from(err: std::io::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InstallError::MissingTable {
            table: "users".into(),
        };
        assert_eq!(err.to_string(), "no `users` table was found in the database");

        let err = InstallError::SchemaApplication {
            applied: 1,
            total: 2,
        };
        assert_eq!(
            err.to_string(),
            "failed to create database tables (1 of 2 schema files applied)"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "closed");
        let err: InstallError = io_err.into();
        assert!(matches!(err, InstallError::Prompt(_)));
    }
}
