//! Application database connection wrapper.
//!
//! [`AppDb`] owns a DuckDB [`Connection`] and provides the transaction helper
//! the runner applies each migration unit through.

use crate::error::{MigrateError, MigrateResult};
use duckdb::Connection;
use std::path::{Path, PathBuf};

/// Wrapper around a DuckDB connection to the application database.
///
/// Single-threaded: the runner is driven from one call site at startup.
pub struct AppDb {
    conn: Connection,
    path: Option<PathBuf>,
}

/// Handle to an open transaction, only available inside
/// [`AppDb::transaction`].
///
/// Functions that must run in the same transaction as a migration unit (the
/// schema version write) take a `&Tx` instead of a bare connection.
pub struct Tx<'a> {
    conn: &'a Connection,
}

impl Tx<'_> {
    /// Borrow the connection the transaction is running on.
    pub fn conn(&self) -> &Connection {
        self.conn
    }

    /// Execute one or more `;`-separated statements inside the transaction.
    pub fn execute_batch(&self, sql: &str) -> MigrateResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl AppDb {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> MigrateResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| MigrateError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an existing database file without write access.
    pub fn open_read_only(path: &Path) -> MigrateResult<Self> {
        let config = duckdb::Config::default()
            .access_mode(duckdb::AccessMode::ReadOnly)
            .map_err(|e| MigrateError::ConnectionError(e.to_string()))?;
        let conn = Connection::open_with_flags(path, config)
            .map_err(|e| MigrateError::ConnectionError(format!("{e}: {}", path.display())))?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database. Useful for tests that don't need
    /// persistence or backups.
    pub fn open_memory() -> MigrateResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MigrateError::ConnectionError(e.to_string()))?;
        Ok(Self { conn, path: None })
    }

    /// Borrow the underlying DuckDB connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Database file path, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flush the write-ahead log into the main database file so a byte copy
    /// of the file is complete.
    pub fn checkpoint(&self) -> MigrateResult<()> {
        self.conn.execute_batch("CHECKPOINT")?;
        Ok(())
    }

    /// Execute `body` within a `BEGIN` / `COMMIT` transaction, rolling back on
    /// error.
    pub fn transaction<F, T>(&self, body: F) -> MigrateResult<T>
    where
        F: FnOnce(&Tx<'_>) -> MigrateResult<T>,
    {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| MigrateError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&Tx { conn: &self.conn });

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                        log::warn!("ROLLBACK after failed COMMIT failed: {rollback_err}");
                    }
                    return Err(MigrateError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    )));
                }
            }
            Err(_) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK") {
                    log::warn!("ROLLBACK failed: {rollback_err}");
                }
            }
        }
        result
    }

    /// Check whether a table exists in the `main` schema.
    pub fn table_exists(&self, table: &str) -> MigrateResult<bool> {
        table_exists(&self.conn, table)
    }
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> MigrateResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE table_schema = 'main' AND table_name = ?",
        duckdb::params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
#[path = "connection_test.rs"]
mod tests;
