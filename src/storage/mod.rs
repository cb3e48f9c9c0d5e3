//! Storage module for persisting normalized ads
//!
//! The `ads` table is created dynamically from the inferred schema and is
//! the sole durable state of the harvester: resumability across restarts is
//! the existence check, not a saved crawl cursor. Every operation opens its
//! own scoped connection and releases it on all exit paths, so a crash
//! mid-run leaves only fully committed upserts behind.

use crate::normalize::Row;
use crate::schema::{InferredSchema, IDENTITY_COLUMN};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Row is missing its identity column")]
    MissingIdentity,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// SQLite-backed store for the `ads` table
///
/// Holds only the database path; connections are opened per operation.
pub struct AdStore {
    path: PathBuf,
}

impl AdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StorageResult<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Creates the `ads` table from the inferred schema if it does not exist
    ///
    /// Idempotent DDL: issuing it against an already-initialized store is a
    /// no-op, never a destructive migration.
    pub fn ensure_schema(&self, schema: &InferredSchema) -> StorageResult<()> {
        let mut columns_def = Vec::with_capacity(schema.len());
        for (name, column_type) in schema.columns() {
            if name == IDENTITY_COLUMN {
                columns_def.push(format!("\"{}\" INTEGER PRIMARY KEY", IDENTITY_COLUMN));
            } else {
                columns_def.push(format!("\"{}\" {}", name, column_type.sql_type()));
            }
        }
        let create_sql = format!(
            "CREATE TABLE IF NOT EXISTS ads ({})",
            columns_def.join(", ")
        );

        let conn = self.connect()?;
        conn.execute(&create_sql, [])?;
        Ok(())
    }

    /// Checks whether an ad with the given identity is already stored
    pub fn exists(&self, ad_id: u64) -> StorageResult<bool> {
        let conn = self.connect()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM ads WHERE \"id\" = ?1",
                params![ad_id as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Inserts a row, fully replacing any existing row with the same identity
    ///
    /// Last-write-wins: all non-identity columns take the new row's values,
    /// atomically per row.
    pub fn upsert(&self, row: &Row) -> StorageResult<()> {
        if row.get(IDENTITY_COLUMN).is_none() {
            return Err(StorageError::MissingIdentity);
        }

        let columns = row
            .cells()
            .iter()
            .map(|(name, _)| format!("\"{}\"", name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=row.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO ads ({}) VALUES ({})",
            columns, placeholders
        );

        let values: Vec<&dyn rusqlite::ToSql> = row
            .cells()
            .iter()
            .map(|(_, cell)| cell as &dyn rusqlite::ToSql)
            .collect();

        let conn = self.connect()?;
        conn.execute(&sql, values.as_slice())?;
        Ok(())
    }

    /// Counts stored ads
    pub fn count(&self) -> StorageResult<u64> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM ads", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
