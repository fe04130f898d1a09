// Schema file loading and application
//
// One .sql file per plugin table. Each file is prefix-substituted, stripped
// of block comments, split into statements, and executed inside its own
// transaction. If any file fails to apply, every table derived from the file
// list is dropped (best-effort) so a re-run starts from a clean slate.

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use log::{info, warn};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::database::connection::ForumDatabase;

/// Placeholder substring replaced with the configured table prefix.
pub const PREFIX_TOKEN: &str = "{prefix}";

/// DDL for one logical table, already prefixed and split into statements.
#[derive(Debug, Clone)]
pub struct SchemaFile {
    /// Prefixed table name derived from the file name ({prefix}{file-stem}).
    pub table_name: String,
    pub statements: Vec<String>,
    /// Whether the first statement is a CREATE or ALTER.
    pub schema_change: bool,
}

/// The full set of schema files for one installation run.
pub struct SchemaSet {
    files: Vec<SchemaFile>,
}

/// Outcome of applying a schema set.
#[derive(Debug)]
pub struct SchemaReport {
    pub total: usize,
    pub applied: usize,
    /// (table name, reason) for every file that did not count as applied.
    pub failures: Vec<(String, String)>,
}

impl SchemaSet {
    /// Load every .sql file in `dir`, in file-name order.
    pub fn load(dir: &Path, prefix: &str) -> Result<Self> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("failed to read schema directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("sql"))
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            warn!("no schema files found in {}", dir.display());
        }

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read schema file {}", path.display()))?;

            let sql = substitute_prefix(&raw, prefix);
            let sql = strip_block_comments(&sql)?;
            let statements = split_statements(&sql);

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            let schema_change = statements.first().map_or(false, |s| is_schema_change(s));

            files.push(SchemaFile {
                table_name: format!("{}{}", prefix, stem),
                statements,
                schema_change,
            });
        }

        Ok(SchemaSet { files })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Prefixed table names, in application order.
    pub fn table_names(&self) -> Vec<String> {
        self.files.iter().map(|f| f.table_name.clone()).collect()
    }

    /// Apply every file against the database. A file counts as applied when
    /// its transaction commits and its leading statement is a CREATE/ALTER.
    /// Failures are collected, never propagated; the caller decides whether
    /// the shortfall is fatal.
    pub async fn apply(&self, db: &dyn ForumDatabase, progress: Option<&ProgressBar>) -> SchemaReport {
        let mut report = SchemaReport {
            total: self.files.len(),
            applied: 0,
            failures: Vec::new(),
        };

        for file in &self.files {
            if let Some(bar) = progress {
                bar.set_message(file.table_name.clone());
            }

            match db.apply_statements(&file.statements).await {
                Ok(()) if file.schema_change => {
                    info!("applied schema for {}", file.table_name);
                    report.applied += 1;
                }
                Ok(()) => {
                    warn!("schema file for {} has no CREATE or ALTER statement", file.table_name);
                    report
                        .failures
                        .push((file.table_name.clone(), "no CREATE or ALTER statement".into()));
                }
                Err(e) => {
                    warn!("failed to apply schema for {}: {:#}", file.table_name, e);
                    report.failures.push((file.table_name.clone(), e.to_string()));
                }
            }

            if let Some(bar) = progress {
                bar.inc(1);
            }
        }

        report
    }

    /// Drop every table derived from the file list. Best-effort: a failed
    /// drop is logged and the pass keeps going. Returns how many succeeded.
    pub async fn drop_tables(&self, db: &dyn ForumDatabase) -> usize {
        let mut dropped = 0;
        for table in self.table_names() {
            match db.drop_table(&table).await {
                Ok(()) => {
                    info!("dropped table {}", table);
                    dropped += 1;
                }
                Err(e) => warn!("failed to drop table {}: {:#}", table, e),
            }
        }
        dropped
    }
}

/// Replace every `{prefix}` token with the configured prefix.
pub fn substitute_prefix(sql: &str, prefix: &str) -> String {
    sql.replace(PREFIX_TOKEN, prefix)
}

/// Remove /* ... */ block comments, including multiline ones.
pub fn strip_block_comments(sql: &str) -> Result<String> {
    let re = Regex::new(r"(?s)/\*.*?\*/").context("failed to compile comment regex")?;
    Ok(re.replace_all(sql, "").into_owned())
}

/// Split on the statement terminator, dropping empty fragments.
pub fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Whether a statement creates or alters a table.
pub fn is_schema_change(statement: &str) -> bool {
    let keyword = statement.split_whitespace().next().unwrap_or("");
    keyword.eq_ignore_ascii_case("CREATE") || keyword.eq_ignore_ascii_case("ALTER")
}
