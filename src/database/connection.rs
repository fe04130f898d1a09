// Database connection management
//
// ForumDatabase is the seam the wizard talks through; production code uses
// the sqlx-backed DatabaseConnection, tests use stub implementations so the
// full workflow runs without a real database.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::{MySqlPool, PgPool, Row};

use crate::config::UserColumnMap;
use crate::utils::validation::{quote_mysql, quote_postgres};

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    MySql,
    Postgres,
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseEngine::MySql => write!(f, "mysql"),
            DatabaseEngine::Postgres => write!(f, "postgres"),
        }
    }
}

/// A row from the host application's users table.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub email: String,
}

/// Field values for a new administrator row.
#[derive(Debug)]
pub struct NewAdmin<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub email: &'a str,
    pub status: &'a str,
}

// =============================================================================
// ForumDatabase trait — everything the wizard needs from the database
// =============================================================================

/// Database operations used by the installation workflow.
///
/// Table and column names interpolated by implementations must already have
/// passed identifier validation; all values are bind parameters.
#[async_trait]
pub trait ForumDatabase: Send + Sync {
    /// Connectivity check.
    async fn ping(&self) -> Result<()>;

    /// Names of the tables present in the connected database.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Execute a batch of statements inside a single transaction.
    async fn apply_statements(&self, statements: &[String]) -> Result<()>;

    /// Drop a single table. Used by the schema rollback pass.
    async fn drop_table(&self, table: &str) -> Result<()>;

    /// Count rows where `column` equals `value` exactly (case-sensitive).
    async fn count_matching(&self, table: &str, column: &str, value: &str) -> Result<i64>;

    /// Fetch a user row by numeric identifier.
    async fn find_user_by_id(
        &self,
        table: &str,
        map: &UserColumnMap,
        id: u64,
    ) -> Result<Option<AdminUser>>;

    /// Insert a new user row and return the generated identifier.
    async fn insert_user(&self, table: &str, map: &UserColumnMap, user: &NewAdmin<'_>)
        -> Result<u64>;

    /// Insert an access-grant row stamped with the current time.
    async fn insert_access_grant(
        &self,
        table: &str,
        access_level_id: i64,
        user_id: u64,
    ) -> Result<()>;
}

// =============================================================================
// DbConnector trait — enables deterministic testing without a real DB
// =============================================================================

/// Opens a database connection for the wizard's verification step.
#[async_trait]
pub trait DbConnector: Send + Sync {
    async fn connect(&self, engine: DatabaseEngine, url: &str) -> Result<Box<dyn ForumDatabase>>;
}

/// Production connector that actually connects to databases.
pub struct RealDbConnector;

#[async_trait]
impl DbConnector for RealDbConnector {
    async fn connect(&self, engine: DatabaseEngine, url: &str) -> Result<Box<dyn ForumDatabase>> {
        Ok(Box::new(DatabaseConnection::connect(engine, url).await?))
    }
}

// =============================================================================
// Production implementation over sqlx pools
// =============================================================================

/// Database connection enum supporting both MySQL and PostgreSQL.
#[derive(Clone)]
pub enum DatabaseConnection {
    MySql(MySqlPool),
    Postgres(PgPool),
}

impl DatabaseConnection {
    /// Open a connection for the requested engine.
    pub async fn connect(engine: DatabaseEngine, url: &str) -> Result<Self> {
        // One connection is enough; the wizard is strictly sequential.
        match engine {
            DatabaseEngine::MySql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(1)
                    .connect(url)
                    .await
                    .context("failed to connect to MySQL")?;
                Ok(DatabaseConnection::MySql(pool))
            }
            DatabaseEngine::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect(url)
                    .await
                    .context("failed to connect to PostgreSQL")?;
                Ok(DatabaseConnection::Postgres(pool))
            }
        }
    }
}

#[async_trait]
impl ForumDatabase for DatabaseConnection {
    async fn ping(&self) -> Result<()> {
        match self {
            DatabaseConnection::MySql(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .context("connectivity check failed (MySQL)")?;
            }
            DatabaseConnection::Postgres(pool) => {
                sqlx::query("SELECT 1")
                    .execute(pool)
                    .await
                    .context("connectivity check failed (PostgreSQL)")?;
            }
        }
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<String>> {
        match self {
            DatabaseConnection::MySql(pool) => sqlx::query_scalar::<_, String>(
                r#"
                SELECT table_name
                FROM information_schema.tables
                WHERE table_schema = DATABASE()
                "#,
            )
            .fetch_all(pool)
            .await
            .context("failed to list tables (MySQL)"),
            DatabaseConnection::Postgres(pool) => sqlx::query_scalar::<_, String>(
                r#"
                SELECT tablename
                FROM pg_tables
                WHERE schemaname = current_schema()
                "#,
            )
            .fetch_all(pool)
            .await
            .context("failed to list tables (PostgreSQL)"),
        }
    }

    async fn apply_statements(&self, statements: &[String]) -> Result<()> {
        // MySQL commits DDL implicitly, so the transaction only shields DML
        // there; the caller's drop pass remains the cross-file safety net.
        match self {
            DatabaseConnection::MySql(pool) => {
                let mut tx = pool.begin().await.context("failed to begin transaction")?;
                for statement in statements {
                    sqlx::query(statement)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("failed to execute: {}", first_line(statement)))?;
                }
                tx.commit().await.context("failed to commit transaction")?;
            }
            DatabaseConnection::Postgres(pool) => {
                let mut tx = pool.begin().await.context("failed to begin transaction")?;
                for statement in statements {
                    sqlx::query(statement)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("failed to execute: {}", first_line(statement)))?;
                }
                tx.commit().await.context("failed to commit transaction")?;
            }
        }
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<()> {
        match self {
            DatabaseConnection::MySql(pool) => {
                let sql = format!("DROP TABLE {}", quote_mysql(table));
                sqlx::query(&sql)
                    .execute(pool)
                    .await
                    .with_context(|| format!("failed to drop table {}", table))?;
            }
            DatabaseConnection::Postgres(pool) => {
                let sql = format!("DROP TABLE {}", quote_postgres(table));
                sqlx::query(&sql)
                    .execute(pool)
                    .await
                    .with_context(|| format!("failed to drop table {}", table))?;
            }
        }
        Ok(())
    }

    async fn count_matching(&self, table: &str, column: &str, value: &str) -> Result<i64> {
        match self {
            DatabaseConnection::MySql(pool) => {
                let sql = format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = ?",
                    quote_mysql(table),
                    quote_mysql(column)
                );
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(value)
                    .fetch_one(pool)
                    .await
                    .with_context(|| format!("failed to count rows in {}", table))
            }
            DatabaseConnection::Postgres(pool) => {
                let sql = format!(
                    "SELECT COUNT(*) FROM {} WHERE {} = $1",
                    quote_postgres(table),
                    quote_postgres(column)
                );
                sqlx::query_scalar::<_, i64>(&sql)
                    .bind(value)
                    .fetch_one(pool)
                    .await
                    .with_context(|| format!("failed to count rows in {}", table))
            }
        }
    }

    async fn find_user_by_id(
        &self,
        table: &str,
        map: &UserColumnMap,
        id: u64,
    ) -> Result<Option<AdminUser>> {
        match self {
            DatabaseConnection::MySql(pool) => {
                let sql = format!(
                    "SELECT {username}, {password}, {email} FROM {table} WHERE `id` = ? LIMIT 1",
                    username = quote_mysql(&map.username),
                    password = quote_mysql(&map.password),
                    email = quote_mysql(&map.email),
                    table = quote_mysql(table),
                );
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .with_context(|| format!("failed to fetch user {} from {}", id, table))?;

                match row {
                    Some(row) => Ok(Some(AdminUser {
                        id,
                        username: row.try_get(map.username.as_str())?,
                        password_hash: row.try_get(map.password.as_str())?,
                        email: row.try_get(map.email.as_str())?,
                    })),
                    None => Ok(None),
                }
            }
            DatabaseConnection::Postgres(pool) => {
                let sql = format!(
                    "SELECT {username}, {password}, {email} FROM {table} WHERE \"id\" = $1 LIMIT 1",
                    username = quote_postgres(&map.username),
                    password = quote_postgres(&map.password),
                    email = quote_postgres(&map.email),
                    table = quote_postgres(table),
                );
                let row = sqlx::query(&sql)
                    .bind(id as i64)
                    .fetch_optional(pool)
                    .await
                    .with_context(|| format!("failed to fetch user {} from {}", id, table))?;

                match row {
                    Some(row) => Ok(Some(AdminUser {
                        id,
                        username: row.try_get(map.username.as_str())?,
                        password_hash: row.try_get(map.password.as_str())?,
                        email: row.try_get(map.email.as_str())?,
                    })),
                    None => Ok(None),
                }
            }
        }
    }

    async fn insert_user(
        &self,
        table: &str,
        map: &UserColumnMap,
        user: &NewAdmin<'_>,
    ) -> Result<u64> {
        match self {
            DatabaseConnection::MySql(pool) => {
                let sql = format!(
                    "INSERT INTO {table} ({username}, {password}, {email}, {status}) VALUES (?, ?, ?, ?)",
                    table = quote_mysql(table),
                    username = quote_mysql(&map.username),
                    password = quote_mysql(&map.password),
                    email = quote_mysql(&map.email),
                    status = quote_mysql(&map.status),
                );
                let result = sqlx::query(&sql)
                    .bind(user.username)
                    .bind(user.password_hash)
                    .bind(user.email)
                    .bind(user.status)
                    .execute(pool)
                    .await
                    .with_context(|| format!("failed to insert user into {}", table))?;
                Ok(result.last_insert_id())
            }
            DatabaseConnection::Postgres(pool) => {
                let sql = format!(
                    "INSERT INTO {table} ({username}, {password}, {email}, {status}) VALUES ($1, $2, $3, $4) RETURNING id",
                    table = quote_postgres(table),
                    username = quote_postgres(&map.username),
                    password = quote_postgres(&map.password),
                    email = quote_postgres(&map.email),
                    status = quote_postgres(&map.status),
                );
                let id: i64 = sqlx::query_scalar(&sql)
                    .bind(user.username)
                    .bind(user.password_hash)
                    .bind(user.email)
                    .bind(user.status)
                    .fetch_one(pool)
                    .await
                    .with_context(|| format!("failed to insert user into {}", table))?;
                Ok(id as u64)
            }
        }
    }

    async fn insert_access_grant(
        &self,
        table: &str,
        access_level_id: i64,
        user_id: u64,
    ) -> Result<()> {
        match self {
            DatabaseConnection::MySql(pool) => {
                let sql = format!(
                    "INSERT INTO {} (`access_level_id`, `user_id`, `created`) VALUES (?, ?, NOW())",
                    quote_mysql(table)
                );
                sqlx::query(&sql)
                    .bind(access_level_id)
                    .bind(user_id)
                    .execute(pool)
                    .await
                    .with_context(|| format!("failed to insert access grant into {}", table))?;
            }
            DatabaseConnection::Postgres(pool) => {
                let sql = format!(
                    "INSERT INTO {} (\"access_level_id\", \"user_id\", \"created\") VALUES ($1, $2, NOW())",
                    quote_postgres(table)
                );
                sqlx::query(&sql)
                    .bind(access_level_id)
                    .bind(user_id as i64)
                    .execute(pool)
                    .await
                    .with_context(|| format!("failed to insert access grant into {}", table))?;
            }
        }
        Ok(())
    }
}

fn first_line(statement: &str) -> &str {
    statement.lines().next().unwrap_or(statement).trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_display() {
        assert_eq!(DatabaseEngine::MySql.to_string(), "mysql");
        assert_eq!(DatabaseEngine::Postgres.to_string(), "postgres");
    }

    #[test]
    fn test_engine_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            engine: DatabaseEngine,
        }

        let w: Wrapper = serde_json::from_str(r#"{"engine":"mysql"}"#).unwrap();
        assert_eq!(w.engine, DatabaseEngine::MySql);

        let w: Wrapper = serde_json::from_str(r#"{"engine":"postgres"}"#).unwrap();
        assert_eq!(w.engine, DatabaseEngine::Postgres);

        assert!(serde_json::from_str::<Wrapper>(r#"{"engine":"oracle"}"#).is_err());
    }

    #[test]
    fn test_first_line_truncates_multiline_statements() {
        assert_eq!(
            first_line("CREATE TABLE `t` (\n  `id` INT\n)"),
            "CREATE TABLE `t` ("
        );
        assert_eq!(first_line("SELECT 1"), "SELECT 1");
    }
}
