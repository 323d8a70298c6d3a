//! Error types for the migration runner.

use crate::runner::RunPhase;
use lectern_core::{Ordinal, SchemaVersion};
use std::path::PathBuf;
use thiserror::Error;

/// Migration runner errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Failed to open or create the database (M001).
    #[error("[M001] Database connection failed: {0}")]
    ConnectionError(String),

    /// A migration file name does not start with a valid ordinal (M002).
    #[error("[M002] Malformed migration name '{name}': {reason}")]
    MalformedMigrationName { name: String, reason: String },

    /// Two migration units share an ordinal (M003).
    #[error("[M003] Duplicate migration ordinal {ordinal}: '{first}' and '{second}'")]
    DuplicateMigrationOrdinal {
        ordinal: Ordinal,
        first: String,
        second: String,
    },

    /// The migration lock sentinel already exists (M004).
    #[error("[M004] Migration already in progress (lock held at {})", path.display())]
    AlreadyLocked { path: PathBuf },

    /// Pre-migration backup could not be written (M005).
    #[error("[M005] Backup to {} failed, no migration was applied: {source}", dir.display())]
    BackupFailed {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
        /// Phases the aborted run went through
        phases: Vec<RunPhase>,
    },

    /// A migration unit failed and its transaction was rolled back (M006).
    #[error(
        "[M006] Migration {ordinal} ({name}) failed and was rolled back; \
         the database is at version {committed}. Backups are in {}",
        backups_dir.display()
    )]
    MigrationFailed {
        ordinal: Ordinal,
        name: String,
        committed: SchemaVersion,
        backups_dir: PathBuf,
        #[source]
        source: Box<MigrateError>,
        /// Phases the aborted run went through
        phases: Vec<RunPhase>,
    },

    /// The persisted schema version is not an integer (M007).
    #[error("[M007] Stored schema_version '{value}' is not a valid version")]
    CorruptSchemaVersion { value: String },

    /// A version write would not move the schema version forward (M008).
    #[error("[M008] Refusing to move schema version from {current} to {requested}")]
    VersionRegression {
        current: SchemaVersion,
        requested: SchemaVersion,
    },

    /// Transaction management error (M009).
    #[error("[M009] Transaction failed: {0}")]
    TransactionError(String),

    /// Filesystem error with path context (M010).
    #[error("[M010] I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// DuckDB driver error with preserved source chain (M011).
    #[error("[M011] DuckDB error: {0}")]
    DuckDb(#[source] duckdb::Error),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<duckdb::Error> for MigrateError {
    fn from(err: duckdb::Error) -> Self {
        MigrateError::DuckDb(err)
    }
}

impl MigrateError {
    /// Phase trace of the run that failed with this error, empty when the
    /// error did not come from [`MigrationRunner::run`](crate::MigrationRunner::run).
    pub fn phases(&self) -> &[RunPhase] {
        match self {
            MigrateError::BackupFailed { phases, .. }
            | MigrateError::MigrationFailed { phases, .. } => phases,
            _ => &[],
        }
    }

    /// Attach the trace of an aborted run.
    pub(crate) fn with_phases(mut self, trace: Vec<RunPhase>) -> Self {
        if let MigrateError::BackupFailed { phases, .. }
        | MigrateError::MigrationFailed { phases, .. } = &mut self
        {
            *phases = trace;
        }
        self
    }

    /// Attach a path to an I/O error.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrateError::Io {
            path: path.into(),
            source,
        }
    }
}
