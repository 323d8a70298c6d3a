//! Migration runner.
//!
//! One run walks the phases `NotStarted → LockAcquired → (BackedUp) →
//! Applying(n) → Committed(n) … → Released`, or ends with
//! `RolledBack(n) → Aborted → Released` on the first failing unit. Every
//! unit commits together with its schema version bump, so the stored version
//! always names the last unit whose statements are actually in the database.

use crate::backup::{snapshot, BackupSet};
use crate::catalog::{Catalog, MigrationSource};
use crate::connection::AppDb;
use crate::error::{MigrateError, MigrateResult};
use crate::lock::LockManager;
use crate::version::{read_version, write_version};
use lectern_core::{AppLayout, Ordinal, SchemaVersion};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Phase of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "ordinal", rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    LockAcquired,
    BackedUp,
    Applying(Ordinal),
    Committed(Ordinal),
    RolledBack(Ordinal),
    Aborted,
    Released,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::NotStarted => write!(f, "not_started"),
            RunPhase::LockAcquired => write!(f, "lock_acquired"),
            RunPhase::BackedUp => write!(f, "backed_up"),
            RunPhase::Applying(o) => write!(f, "applying({o})"),
            RunPhase::Committed(o) => write!(f, "committed({o})"),
            RunPhase::RolledBack(o) => write!(f, "rolled_back({o})"),
            RunPhase::Aborted => write!(f, "aborted"),
            RunPhase::Released => write!(f, "released"),
        }
    }
}

/// A unit committed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedUnit {
    pub ordinal: Ordinal,
    pub name: String,
    pub duration_ms: u64,
}

/// Result of a run that held the lock and finished without error.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// Version read before applying anything
    pub from_version: SchemaVersion,
    /// Version after the run
    pub to_version: SchemaVersion,
    /// Units committed by this run, in order
    pub applied: Vec<AppliedUnit>,
    /// Backup taken before the first unit; `None` when nothing was pending
    pub backup: Option<BackupSet>,
    /// Phase transitions of the run
    pub phases: Vec<RunPhase>,
}

impl MigrationReport {
    /// Number of units committed by this run.
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Outcome of [`MigrationRunner::run`].
#[derive(Debug)]
pub enum RunOutcome {
    /// Another run holds the lock. Nothing was read or changed; retry later.
    InProgress { lock_path: PathBuf },
    /// The run held the lock and every pending unit was applied.
    Completed(MigrationReport),
}

/// Pending unit as listed by [`MigrationRunner::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingUnit {
    pub ordinal: Ordinal,
    pub name: String,
}

/// Read-only view of where the database stands against the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub current: SchemaVersion,
    pub latest: SchemaVersion,
    pub pending: Vec<PendingUnit>,
    /// Whether a lock sentinel currently exists
    pub locked: bool,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Applies pending migrations to one database file.
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    database: PathBuf,
    aux_dir: Option<PathBuf>,
    backups_dir: PathBuf,
    lock: LockManager,
    source: MigrationSource,
}

impl MigrationRunner {
    pub fn new(
        database: impl Into<PathBuf>,
        lock_file: impl Into<PathBuf>,
        backups_dir: impl Into<PathBuf>,
        source: MigrationSource,
    ) -> Self {
        Self {
            database: database.into(),
            aux_dir: None,
            backups_dir: backups_dir.into(),
            lock: LockManager::new(lock_file),
            source,
        }
    }

    /// Also archive `dir` in every pre-migration backup.
    pub fn with_aux_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.aux_dir = Some(dir.into());
        self
    }

    /// Runner for the database, lock, backups, and migrations of `layout`.
    pub fn from_layout(layout: &AppLayout) -> Self {
        Self::new(
            &layout.database,
            &layout.lock_file,
            &layout.backups_dir,
            MigrationSource::from_layout(layout),
        )
        .with_aux_dir(&layout.aux_dir)
    }

    pub fn database(&self) -> &Path {
        &self.database
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    pub fn lock(&self) -> &LockManager {
        &self.lock
    }

    /// Bring the database up to the latest catalog version.
    ///
    /// Returns [`RunOutcome::InProgress`] without touching anything when the
    /// lock is held. The lock is released on every other path, including
    /// errors. Safe to call on every startup: with nothing pending it only
    /// takes and releases the lock.
    pub fn run(&self) -> MigrateResult<RunOutcome> {
        let mut trace = PhaseTrace::new();

        let guard = match self.lock.acquire() {
            Ok(guard) => guard,
            Err(MigrateError::AlreadyLocked { path }) => {
                log::info!("Migration in progress (lock at {})", path.display());
                return Ok(RunOutcome::InProgress { lock_path: path });
            }
            Err(e) => return Err(e),
        };
        trace.enter(RunPhase::LockAcquired);

        let result = self.run_locked(&mut trace);
        if result.is_err() && trace.last() != Some(RunPhase::Aborted) {
            trace.enter(RunPhase::Aborted);
        }

        match guard.release() {
            Ok(()) => trace.enter(RunPhase::Released),
            Err(e) => log::warn!(
                "{e}. Remove the lock with `lectern force-unlock` once no migration is running."
            ),
        }

        match result {
            Ok(mut report) => {
                report.phases = trace.into_phases();
                Ok(RunOutcome::Completed(report))
            }
            Err(e) => Err(e.with_phases(trace.into_phases())),
        }
    }

    fn run_locked(&self, trace: &mut PhaseTrace) -> MigrateResult<MigrationReport> {
        let catalog = Catalog::discover(&self.source)?;

        if let Some(parent) = self.database.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MigrateError::io(parent, e))?;
        }
        let existed = self.database.is_file();
        let db = AppDb::open(&self.database)?;

        let from_version = read_version(db.conn())?;
        let pending = catalog.pending(from_version);
        if pending.is_empty() {
            log::debug!("Schema is up to date at version {from_version}");
            return Ok(MigrationReport {
                from_version,
                to_version: from_version,
                applied: Vec::new(),
                backup: None,
                phases: Vec::new(),
            });
        }

        log::info!(
            "Migrating schema from version {from_version} to {} ({} pending)",
            catalog.latest(),
            pending.len()
        );

        if existed {
            db.checkpoint()?;
        }
        let backup = snapshot(
            existed.then_some(self.database.as_path()),
            self.aux_dir.as_deref(),
            &self.backups_dir,
        )?;
        trace.enter(RunPhase::BackedUp);

        let mut committed = from_version;
        let mut applied = Vec::with_capacity(pending.len());

        for unit in pending {
            trace.enter(RunPhase::Applying(unit.ordinal));
            let started = Instant::now();

            let result = db.transaction(|tx| {
                tx.execute_batch(&unit.sql)?;
                write_version(tx, SchemaVersion::from(unit.ordinal))
            });

            if let Err(e) = result {
                trace.enter(RunPhase::RolledBack(unit.ordinal));
                trace.enter(RunPhase::Aborted);
                log::error!("Migration {} ({}) failed: {e}", unit.ordinal, unit.name);
                return Err(MigrateError::MigrationFailed {
                    ordinal: unit.ordinal,
                    name: unit.name.clone(),
                    committed,
                    backups_dir: self.backups_dir.clone(),
                    source: Box::new(e),
                    phases: Vec::new(),
                });
            }

            trace.enter(RunPhase::Committed(unit.ordinal));
            committed = SchemaVersion::from(unit.ordinal);
            let duration_ms = started.elapsed().as_millis() as u64;
            log::info!("Applied migration {} ({duration_ms} ms)", unit.name);
            applied.push(AppliedUnit {
                ordinal: unit.ordinal,
                name: unit.name.clone(),
                duration_ms,
            });
        }

        Ok(MigrationReport {
            from_version,
            to_version: committed,
            applied,
            backup: Some(backup),
            phases: Vec::new(),
        })
    }

    /// Compare the database against the catalog without taking the lock or
    /// creating the database.
    pub fn status(&self) -> MigrateResult<MigrationStatus> {
        let catalog = Catalog::discover(&self.source)?;
        let current = if self.database.is_file() {
            let db = AppDb::open_read_only(&self.database)?;
            read_version(db.conn())?
        } else {
            SchemaVersion::INITIAL
        };

        Ok(MigrationStatus {
            current,
            latest: catalog.latest(),
            pending: catalog
                .pending(current)
                .iter()
                .map(|u| PendingUnit {
                    ordinal: u.ordinal,
                    name: u.name.clone(),
                })
                .collect(),
            locked: self.lock.is_locked(),
        })
    }
}

/// Ordered record of the phases a run went through.
struct PhaseTrace {
    phases: Vec<RunPhase>,
}

impl PhaseTrace {
    fn new() -> Self {
        Self {
            phases: vec![RunPhase::NotStarted],
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        if let Some(prev) = self.phases.last() {
            log::debug!("migration run: {prev} -> {phase}");
        }
        self.phases.push(phase);
    }

    fn last(&self) -> Option<RunPhase> {
        self.phases.last().copied()
    }

    fn into_phases(self) -> Vec<RunPhase> {
        self.phases
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
