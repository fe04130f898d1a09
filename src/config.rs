// Installer configuration
// An explicit configuration object handed to the wizard at construction,
// loaded from installer.toml with FORUM_INSTALL_* environment overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::database::connection::DatabaseEngine;
use crate::error::InstallError;
use crate::utils::validation::validate_identifier;

/// Connection settings for the host application's database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub engine: DatabaseEngine,
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: DatabaseEngine::MySql,
            url: String::new(),
        }
    }
}

/// Column names in the host application's users table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserColumnMap {
    pub username: String,
    pub password: String,
    pub email: String,
    pub status: String,
}

impl Default for UserColumnMap {
    fn default() -> Self {
        Self {
            username: "username".into(),
            password: "password".into(),
            email: "email".into(),
            status: "status".into(),
        }
    }
}

/// Status values used by the host application's users table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusMap {
    pub active: String,
}

impl Default for StatusMap {
    fn default() -> Self {
        Self { active: "1".into() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    pub database: DatabaseSettings,
    /// Prepended to every plugin table name (and substituted into schema files).
    pub table_prefix: String,
    /// Directory holding one DDL file per plugin table.
    pub schema_dir: PathBuf,
    pub user_map: UserColumnMap,
    pub status_map: StatusMap,
    /// Access level granted to the installed administrator.
    pub admin_access_level: i64,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            database: DatabaseSettings::default(),
            table_prefix: "forum_".into(),
            schema_dir: PathBuf::from("schema"),
            user_map: UserColumnMap::default(),
            status_map: StatusMap::default(),
            admin_access_level: 4,
        }
    }
}

impl InstallerConfig {
    /// Load configuration from a TOML file, then apply environment overrides
    /// (FORUM_INSTALL_DATABASE__URL and friends). A missing file is fine as
    /// long as the environment supplies what the defaults don't.
    pub fn load(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.to_path_buf()).required(false))
            .add_source(config::Environment::with_prefix("FORUM_INSTALL").separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Reject configurations that could not possibly install: a missing
    /// connection URL, or prefix/column names that are not plain identifiers
    /// (those get interpolated into SQL and must never carry quoting).
    pub fn validate(&self) -> Result<(), InstallError> {
        if self.database.url.trim().is_empty() {
            return Err(InstallError::Validation(
                "database.url is required (set it in installer.toml or FORUM_INSTALL_DATABASE__URL)"
                    .into(),
            ));
        }

        if !self.table_prefix.is_empty() {
            validate_identifier(&self.table_prefix)?;
        }

        for column in [
            &self.user_map.username,
            &self.user_map.password,
            &self.user_map.email,
            &self.user_map.status,
        ] {
            validate_identifier(column)?;
        }

        if self.admin_access_level <= 0 {
            return Err(InstallError::Validation(
                "admin_access_level must be a positive integer".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = InstallerConfig::default();
        assert_eq!(config.table_prefix, "forum_");
        assert_eq!(config.schema_dir, PathBuf::from("schema"));
        assert_eq!(config.user_map.username, "username");
        assert_eq!(config.admin_access_level, 4);
        assert_eq!(config.database.engine, DatabaseEngine::MySql);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            r#"
            table_prefix = "board_"
            admin_access_level = 9

            [database]
            engine = "postgres"
            url = "postgres://forum@localhost/app"

            [user_map]
            username = "login"
            "#
        )
        .unwrap();

        let config = InstallerConfig::load(file.path()).unwrap();
        assert_eq!(config.table_prefix, "board_");
        assert_eq!(config.admin_access_level, 9);
        assert_eq!(config.database.engine, DatabaseEngine::Postgres);
        assert_eq!(config.user_map.username, "login");
        // Unset fields keep their defaults.
        assert_eq!(config.user_map.email, "email");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = InstallerConfig::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.table_prefix, "forum_");
    }

    #[test]
    fn test_validate_requires_url() {
        let config = InstallerConfig::default();
        assert!(matches!(
            config.validate(),
            Err(InstallError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_identifiers() {
        let mut config = InstallerConfig {
            database: DatabaseSettings {
                engine: DatabaseEngine::MySql,
                url: "mysql://forum@localhost/app".into(),
            },
            ..InstallerConfig::default()
        };
        assert!(config.validate().is_ok());

        config.user_map.username = "user name".into();
        assert!(config.validate().is_err());

        config.user_map.username = "username".into();
        config.table_prefix = "forum`; DROP TABLE users; --".into();
        assert!(config.validate().is_err());
    }
}
