//! Pre-migration backups.
//!
//! A snapshot copies the database file byte-for-byte and zips the auxiliary
//! data directory into the backup directory. Both artifacts carry the same
//! timestamp, computed once per snapshot. Existing files are never
//! overwritten, and nothing is ever pruned.

use crate::error::{MigrateError, MigrateResult};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// `chrono` format of the timestamp embedded in backup names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Upper bound on `_N` suffixes tried when a backup name is taken.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Artifacts written by one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSet {
    /// Timestamp shared by every artifact of this snapshot
    pub timestamp: String,
    /// Copy of the database file, if one existed
    pub database: Option<PathBuf>,
    /// Zip of the auxiliary data directory, if it existed
    pub aux_archive: Option<PathBuf>,
}

impl BackupSet {
    /// True when neither artifact was written.
    pub fn is_empty(&self) -> bool {
        self.database.is_none() && self.aux_archive.is_none()
    }

    /// Paths of the artifacts that were written.
    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.database
            .iter()
            .chain(self.aux_archive.iter())
            .map(PathBuf::as_path)
    }
}

/// Snapshot `db_file` and `aux_dir` into `out_dir`.
///
/// `db_file` is skipped when `None` or not an existing file, `aux_dir` when
/// `None` or not an existing directory. Any I/O failure is returned as
/// [`MigrateError::BackupFailed`]; a partially written artifact is removed.
pub fn snapshot(
    db_file: Option<&Path>,
    aux_dir: Option<&Path>,
    out_dir: &Path,
) -> MigrateResult<BackupSet> {
    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    snapshot_with_timestamp(db_file, aux_dir, out_dir, &timestamp)
}

pub(crate) fn snapshot_with_timestamp(
    db_file: Option<&Path>,
    aux_dir: Option<&Path>,
    out_dir: &Path,
    timestamp: &str,
) -> MigrateResult<BackupSet> {
    let failed = |source: io::Error| MigrateError::BackupFailed {
        dir: out_dir.to_path_buf(),
        source,
        phases: Vec::new(),
    };

    std::fs::create_dir_all(out_dir).map_err(failed)?;

    let database = match db_file.filter(|p| p.is_file()) {
        Some(db) => Some(copy_database(db, out_dir, timestamp).map_err(failed)?),
        None => None,
    };

    let aux_archive = match aux_dir.filter(|p| p.is_dir()) {
        Some(dir) => Some(zip_directory(dir, out_dir, timestamp).map_err(failed)?),
        None => None,
    };

    let set = BackupSet {
        timestamp: timestamp.to_string(),
        database,
        aux_archive,
    };
    for artifact in set.artifacts() {
        log::info!("Backup written: {}", artifact.display());
    }
    Ok(set)
}

fn copy_database(db: &Path, out_dir: &Path, timestamp: &str) -> io::Result<PathBuf> {
    let stem = file_stem(db, "database");
    let ext = db.extension().and_then(|e| e.to_str());
    let (path, mut dest) = create_unique(out_dir, &stem, timestamp, ext)?;

    let result = File::open(db)
        .and_then(|mut src| io::copy(&mut src, &mut dest))
        .and_then(|_| dest.sync_all());
    discard_on_error(result, &path)?;
    Ok(path)
}

fn zip_directory(dir: &Path, out_dir: &Path, timestamp: &str) -> io::Result<PathBuf> {
    let stem = file_stem(dir, "aux");
    let (path, dest) = create_unique(out_dir, &stem, timestamp, Some("zip"))?;
    discard_on_error(write_zip(dir, dest), &path)?;
    Ok(path)
}

fn write_zip(dir: &Path, dest: File) -> io::Result<()> {
    let mut zip = ZipWriter::new(dest);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(io::Error::other)?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        zip.start_file(name, options).map_err(io::Error::other)?;
        let mut src = File::open(entry.path())?;
        io::copy(&mut src, &mut zip)?;
    }

    zip.finish().map_err(io::Error::other)?.sync_all()
}

/// Create `<stem>_<timestamp>[_N].<ext>` in `out_dir` without overwriting
/// anything already there.
fn create_unique(
    out_dir: &Path,
    stem: &str,
    timestamp: &str,
    ext: Option<&str>,
) -> io::Result<(PathBuf, File)> {
    for attempt in 0..MAX_NAME_ATTEMPTS {
        let mut name = format!("{stem}_{timestamp}");
        if attempt > 0 {
            name.push_str(&format!("_{attempt}"));
        }
        if let Some(ext) = ext {
            name.push('.');
            name.push_str(ext);
        }

        let path = out_dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no free backup name for {stem}_{timestamp}"),
    ))
}

fn discard_on_error<T>(result: io::Result<T>, path: &Path) -> io::Result<T> {
    if result.is_err() {
        let _ = std::fs::remove_file(path);
    }
    result
}

fn file_stem(path: &Path, fallback: &str) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

#[cfg(test)]
#[path = "backup_test.rs"]
mod tests;
