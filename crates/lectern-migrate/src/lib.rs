//! Schema migration runner for Lectern.
//!
//! Evolves the application's DuckDB store across upgrades: migration units
//! are discovered from a directory (or the set embedded in the binary),
//! applied one transaction per unit under a filesystem lock, and preceded by
//! a timestamped backup of the database file and the auxiliary data
//! directory.

pub mod backup;
pub mod catalog;
pub mod connection;
mod embedded;
pub mod error;
pub mod lock;
pub mod runner;
pub mod version;

pub use backup::{snapshot, BackupSet};
pub use catalog::{latest_version, Catalog, MigrationSource, MigrationUnit};
pub use connection::{AppDb, Tx};
pub use error::{MigrateError, MigrateResult};
pub use lock::{force_unlock, LockGuard, LockManager};
pub use runner::{
    AppliedUnit, MigrationReport, MigrationRunner, MigrationStatus, PendingUnit, RunOutcome,
    RunPhase,
};
pub use version::{read_version, write_version};
