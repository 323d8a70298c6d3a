//! Integration tests for the migration runner.
//!
//! Each test builds a throwaway data directory with a migrations folder,
//! drives the public `MigrationRunner` API, and inspects the resulting
//! database, backups, and lock sentinel.

use lectern_core::{Ordinal, SchemaVersion};
use lectern_migrate::{
    read_version, write_version, AppDb, LockManager, MigrateError, MigrationReport,
    MigrationRunner, MigrationSource, RunOutcome,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("migrations")).unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn database(&self) -> PathBuf {
        self.root().join("data/app.duckdb")
    }

    fn lock_file(&self) -> PathBuf {
        self.root().join("data/.migrate.lock")
    }

    fn backups(&self) -> PathBuf {
        self.root().join("backups")
    }

    fn aux_dir(&self) -> PathBuf {
        self.root().join("data/subjects")
    }

    /// Write `NNN_tNNN.sql` creating table `tNNN` for every ordinal.
    fn tables(&self, ordinals: &[u32]) {
        for n in ordinals {
            fs::write(
                self.root().join(format!("migrations/{n:03}_t{n}.sql")),
                format!("CREATE TABLE t{n} (id INTEGER);"),
            )
            .unwrap();
        }
    }

    fn runner(&self) -> MigrationRunner {
        MigrationRunner::new(
            self.database(),
            self.lock_file(),
            self.backups(),
            MigrationSource::Directory(self.root().join("migrations")),
        )
        .with_aux_dir(self.aux_dir())
    }

    fn run(&self) -> MigrationReport {
        match self.runner().run().unwrap() {
            RunOutcome::Completed(report) => report,
            RunOutcome::InProgress { .. } => panic!("lock unexpectedly held"),
        }
    }

    fn version(&self) -> SchemaVersion {
        let db = AppDb::open(&self.database()).unwrap();
        read_version(db.conn()).unwrap()
    }

    /// Bring a fresh database to `version` without running any unit.
    fn seed_version(&self, version: u32) {
        fs::create_dir_all(self.database().parent().unwrap()).unwrap();
        let db = AppDb::open(&self.database()).unwrap();
        db.transaction(|tx| write_version(tx, SchemaVersion::new(version)))
            .unwrap();
    }

    fn backup_files(&self) -> Vec<String> {
        match fs::read_dir(self.backups()) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }
}

fn applied_ordinals(report: &MigrationReport) -> Vec<u32> {
    report.applied.iter().map(|u| u.ordinal.get()).collect()
}

// ── Ordering and idempotence ───────────────────────────────────────────

#[test]
fn fresh_database_applies_all_units_in_order() {
    let ws = Workspace::new();
    ws.tables(&[3, 1, 2]);

    let report = ws.run();

    assert_eq!(applied_ordinals(&report), vec![1, 2, 3]);
    assert_eq!(ws.version(), SchemaVersion::new(3));
}

#[test]
fn only_units_above_current_version_are_applied() {
    let ws = Workspace::new();
    ws.tables(&[1, 2, 3, 4]);
    ws.seed_version(3);

    let report = ws.run();

    assert_eq!(applied_ordinals(&report), vec![4]);
    assert_eq!(report.from_version, SchemaVersion::new(3));
    assert_eq!(ws.version(), SchemaVersion::new(4));
    let db = AppDb::open(&ws.database()).unwrap();
    assert!(!db.table_exists("t1").unwrap());
    assert!(db.table_exists("t4").unwrap());
}

#[test]
fn gaps_in_ordinals_are_allowed() {
    let ws = Workspace::new();
    ws.tables(&[1, 5, 20]);
    ws.seed_version(2);

    let report = ws.run();

    assert_eq!(applied_ordinals(&report), vec![5, 20]);
    assert_eq!(ws.version(), SchemaVersion::new(20));
}

#[test]
fn second_run_applies_nothing() {
    for set in [&[1][..], &[1, 2, 3][..], &[2, 7, 9, 10][..]] {
        let ws = Workspace::new();
        ws.tables(set);

        let first = ws.run();
        let second = ws.run();

        assert_eq!(first.applied.len(), set.len());
        assert!(second.applied.is_empty());
        assert_eq!(second.from_version, first.to_version);
    }
}

#[test]
fn new_units_added_between_runs_are_picked_up() {
    let ws = Workspace::new();
    ws.tables(&[1, 2]);
    ws.run();

    ws.tables(&[3]);
    let report = ws.run();

    assert_eq!(applied_ordinals(&report), vec![3]);
    assert_eq!(ws.version(), SchemaVersion::new(3));
}

// ── Failure handling ───────────────────────────────────────────────────

#[test]
fn failed_unit_leaves_version_at_last_commit() {
    let ws = Workspace::new();
    ws.tables(&[1, 2, 4]);
    fs::write(
        ws.root().join("migrations/003_bad.sql"),
        "CREATE TABLE t3 (id INTEGER); INSERT INTO t3 VALUES ('not a number');",
    )
    .unwrap();

    let err = ws.runner().run().unwrap_err();

    match err {
        MigrateError::MigrationFailed {
            ordinal, committed, ..
        } => {
            assert_eq!(ordinal, Ordinal::new(3).unwrap());
            assert_eq!(committed, SchemaVersion::new(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(ws.version(), SchemaVersion::new(2));
    let db = AppDb::open(&ws.database()).unwrap();
    assert!(db.table_exists("t2").unwrap());
    assert!(!db.table_exists("t3").unwrap());
    assert!(!db.table_exists("t4").unwrap());
    drop(db);
    assert!(!ws.lock_file().exists());
}

#[test]
fn fixed_unit_resumes_after_failure() {
    let ws = Workspace::new();
    ws.tables(&[1]);
    let bad = ws.root().join("migrations/002_fix_me.sql");
    fs::write(&bad, "SELEC broken").unwrap();
    assert!(ws.runner().run().is_err());

    fs::write(&bad, "CREATE TABLE t2 (id INTEGER);").unwrap();
    let report = ws.run();

    assert_eq!(applied_ordinals(&report), vec![2]);
    assert_eq!(ws.version(), SchemaVersion::new(2));
}

#[test]
fn malformed_name_fails_before_opening_database() {
    let ws = Workspace::new();
    ws.tables(&[1]);
    fs::write(ws.root().join("migrations/latest.sql"), "SELECT 1;").unwrap();

    let err = ws.runner().run().unwrap_err();

    assert!(matches!(err, MigrateError::MalformedMigrationName { .. }));
    assert!(!ws.database().exists());
    assert!(!ws.lock_file().exists());
}

// ── Locking ────────────────────────────────────────────────────────────

#[test]
fn held_lock_blocks_run_and_survives_it() {
    let ws = Workspace::new();
    ws.tables(&[1]);
    ws.run();
    ws.tables(&[2]);

    let held = LockManager::new(ws.lock_file()).acquire().unwrap();
    let outcome = ws.runner().run().unwrap();

    assert!(matches!(outcome, RunOutcome::InProgress { .. }));
    assert!(ws.lock_file().exists());
    assert_eq!(ws.version(), SchemaVersion::new(1));

    drop(held);
    assert!(!ws.lock_file().exists());
    assert_eq!(applied_ordinals(&ws.run()), vec![2]);
}

#[test]
fn lock_is_taken_and_released_with_nothing_pending() {
    let ws = Workspace::new();
    ws.tables(&[1]);
    ws.run();

    let report = ws.run();

    assert!(report.applied.is_empty());
    assert!(!ws.lock_file().exists());
    assert!(report
        .phases
        .iter()
        .any(|p| matches!(p, lectern_migrate::RunPhase::LockAcquired)));
}

// ── Backups ────────────────────────────────────────────────────────────

#[test]
fn backup_taken_only_when_units_are_pending() {
    let ws = Workspace::new();
    ws.tables(&[1]);
    fs::create_dir_all(ws.aux_dir()).unwrap();
    fs::write(ws.aux_dir().join("notes.md"), "# Notes").unwrap();

    // Fresh database: only the auxiliary directory is archived.
    ws.run();
    let after_first = ws.backup_files();
    assert_eq!(after_first.len(), 1);
    assert!(after_first[0].starts_with("subjects_") && after_first[0].ends_with(".zip"));

    // Nothing pending: no new artifacts.
    ws.run();
    assert_eq!(ws.backup_files(), after_first);

    // Pending unit on an existing database: database copy plus archive.
    ws.tables(&[2]);
    let report = ws.run();
    let backup = report.backup.unwrap();
    let db_copy = backup.database.unwrap();
    assert!(db_copy.starts_with(ws.backups()));
    assert!(db_copy
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("app_"));
    assert!(backup.aux_archive.is_some());
    assert_eq!(ws.backup_files().len(), 3);
}

#[test]
fn database_backup_holds_pre_migration_schema() {
    let ws = Workspace::new();
    ws.tables(&[1]);
    ws.run();
    ws.tables(&[2]);

    let report = ws.run();
    let copy = report.backup.unwrap().database.unwrap();

    let restored = AppDb::open(&copy).unwrap();
    assert_eq!(read_version(restored.conn()).unwrap(), SchemaVersion::new(1));
    assert!(restored.table_exists("t1").unwrap());
    assert!(!restored.table_exists("t2").unwrap());
}
