//! Migration catalog.
//!
//! Enumerates migration units from a source, parses their ordinals, and
//! exposes them sorted ascending. Building a catalog has no side effects.

use crate::embedded::EMBEDDED_MIGRATIONS;
use crate::error::{MigrateError, MigrateResult};
use lectern_core::{parse_ordinal, AppLayout, CoreError, Ordinal, SchemaVersion};
use std::path::{Path, PathBuf};

/// File extension of migration units in a directory source.
const MIGRATION_EXTENSION: &str = "sql";

/// A single schema-altering migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationUnit {
    /// Ordering key parsed from the name prefix
    pub ordinal: Ordinal,
    /// Identifier the ordinal was parsed from (file name)
    pub name: String,
    /// Statements to execute
    pub sql: String,
}

/// Where migration units come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSource {
    /// `NNN_name.sql` files in a directory
    Directory(PathBuf),
    /// The schema history compiled into the binary
    Embedded,
}

impl MigrationSource {
    /// The configured migration directory, or the embedded set.
    pub fn from_layout(layout: &AppLayout) -> Self {
        match &layout.migrations_dir {
            Some(dir) => MigrationSource::Directory(dir.clone()),
            None => MigrationSource::Embedded,
        }
    }
}

/// Ordered, duplicate-free set of migration units.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    units: Vec<MigrationUnit>,
}

impl Catalog {
    /// Enumerate every unit of `source`, sorted ascending by ordinal.
    pub fn discover(source: &MigrationSource) -> MigrateResult<Self> {
        match source {
            MigrationSource::Embedded => Self::from_entries(
                EMBEDDED_MIGRATIONS
                    .iter()
                    .map(|(name, sql)| (name.to_string(), sql.to_string())),
            ),
            MigrationSource::Directory(dir) => Self::from_entries(read_directory(dir)?),
        }
    }

    /// Build a catalog from `(name, sql)` pairs.
    ///
    /// Fails with [`MigrateError::MalformedMigrationName`] when a name has no
    /// valid ordinal prefix and with [`MigrateError::DuplicateMigrationOrdinal`]
    /// when two names share one.
    pub fn from_entries<I>(entries: I) -> MigrateResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut units = entries
            .into_iter()
            .map(|(name, sql)| {
                let ordinal = parse_ordinal(&name).map_err(malformed)?;
                Ok(MigrationUnit { ordinal, name, sql })
            })
            .collect::<MigrateResult<Vec<_>>>()?;

        units.sort_by(|a, b| a.ordinal.cmp(&b.ordinal).then_with(|| a.name.cmp(&b.name)));

        if let Some(pair) = units.windows(2).find(|w| w[0].ordinal == w[1].ordinal) {
            return Err(MigrateError::DuplicateMigrationOrdinal {
                ordinal: pair[0].ordinal,
                first: pair[0].name.clone(),
                second: pair[1].name.clone(),
            });
        }

        Ok(Self { units })
    }

    /// All units, ascending by ordinal.
    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    /// Units not yet applied at `current`, ascending by ordinal.
    pub fn pending(&self, current: SchemaVersion) -> &[MigrationUnit] {
        let start = self.units.partition_point(|u| !current.is_pending(u.ordinal));
        &self.units[start..]
    }

    /// Highest ordinal in the catalog, or version 0 when it is empty.
    pub fn latest(&self) -> SchemaVersion {
        self.units
            .last()
            .map(|u| SchemaVersion::from(u.ordinal))
            .unwrap_or(SchemaVersion::INITIAL)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Highest ordinal available from `source`, or version 0 when it has none.
pub fn latest_version(source: &MigrationSource) -> MigrateResult<SchemaVersion> {
    Ok(Catalog::discover(source)?.latest())
}

fn malformed(err: CoreError) -> MigrateError {
    match err {
        CoreError::MalformedOrdinal { name, reason } => {
            MigrateError::MalformedMigrationName { name, reason }
        }
        other => MigrateError::MalformedMigrationName {
            name: String::new(),
            reason: other.to_string(),
        },
    }
}

/// Read every `.sql` file directly inside `dir`.
fn read_directory(dir: &Path) -> MigrateResult<Vec<(String, String)>> {
    let mut entries = Vec::new();
    let read_dir = std::fs::read_dir(dir).map_err(|e| MigrateError::io(dir, e))?;

    for entry in read_dir {
        let entry = entry.map_err(|e| MigrateError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !path
            .extension()
            .is_some_and(|ext| ext == MIGRATION_EXTENSION)
        {
            log::debug!("Skipping non-migration file {}", path.display());
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return Err(MigrateError::MalformedMigrationName {
                name: path.display().to_string(),
                reason: "file name is not valid UTF-8".to_string(),
            });
        };
        let sql = std::fs::read_to_string(&path).map_err(|e| MigrateError::io(&path, e))?;
        entries.push((name.to_string(), sql));
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
