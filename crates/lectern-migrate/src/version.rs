//! Schema version store.
//!
//! The version lives in the database it describes, as the `schema_version`
//! row of the `app_meta` key/value table. A missing table or row reads as
//! version 0.

use crate::connection::{table_exists, Tx};
use crate::error::{MigrateError, MigrateResult};
use duckdb::{Connection, OptionalExt};
use lectern_core::SchemaVersion;

/// Key/value table holding the schema version.
pub const META_TABLE: &str = "app_meta";

/// Key of the schema version row.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

const ENSURE_META_TABLE: &str = "CREATE TABLE IF NOT EXISTS app_meta (
    key   VARCHAR PRIMARY KEY,
    value VARCHAR NOT NULL
)";

/// Read the persisted schema version, or [`SchemaVersion::INITIAL`] when the
/// database has never been migrated.
pub fn read_version(conn: &Connection) -> MigrateResult<SchemaVersion> {
    if !table_exists(conn, META_TABLE)? {
        return Ok(SchemaVersion::INITIAL);
    }

    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM app_meta WHERE key = ?",
            duckdb::params![SCHEMA_VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(SchemaVersion::INITIAL),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(SchemaVersion::new)
            .map_err(|_| MigrateError::CorruptSchemaVersion { value: raw }),
    }
}

/// Record `version` inside the open transaction `tx`.
///
/// Must be called on the same transaction as the migration unit it follows,
/// which is why it takes a [`Tx`]. The version only moves forward: a write
/// that is not strictly greater than the stored value fails with
/// [`MigrateError::VersionRegression`], rolling the unit back with it.
pub fn write_version(tx: &Tx<'_>, version: SchemaVersion) -> MigrateResult<()> {
    let current = read_version(tx.conn())?;
    if version <= current {
        return Err(MigrateError::VersionRegression {
            current,
            requested: version,
        });
    }

    tx.execute_batch(ENSURE_META_TABLE)?;
    tx.conn().execute(
        "INSERT INTO app_meta (key, value) VALUES (?, ?)
         ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        duckdb::params![SCHEMA_VERSION_KEY, version.get().to_string()],
    )?;
    log::debug!("schema_version -> {version}");
    Ok(())
}

#[cfg(test)]
#[path = "version_test.rs"]
mod tests;
