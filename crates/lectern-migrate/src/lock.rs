//! Filesystem lock guarding migration runs.
//!
//! The lock is a sentinel file: it exists while a run is in progress.
//! Acquisition is an atomic create-if-absent and never waits. A sentinel
//! left behind by a crashed process stays until an operator removes it with
//! [`force_unlock`].

use crate::error::{MigrateError, MigrateResult};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Acquires the migration lock at a fixed sentinel path.
#[derive(Debug, Clone)]
pub struct LockManager {
    path: PathBuf,
}

/// Held migration lock. Dropping it removes the sentinel.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sentinel path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when a sentinel currently exists.
    pub fn is_locked(&self) -> bool {
        self.path.exists()
    }

    /// Create the sentinel, or fail with [`MigrateError::AlreadyLocked`] if it
    /// already exists. Parent directories are created as needed.
    pub fn acquire(&self) -> MigrateResult<LockGuard> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MigrateError::io(parent, e))?;
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(MigrateError::AlreadyLocked {
                    path: self.path.clone(),
                });
            }
            Err(e) => return Err(MigrateError::io(&self.path, e)),
        };

        let guard = LockGuard {
            path: self.path.clone(),
            released: false,
        };

        // Diagnostics for whoever finds a stale sentinel; never read back.
        let holder = format!(
            "pid={}\nacquired_at={}\n",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );
        if let Err(e) = file.write_all(holder.as_bytes()) {
            log::debug!("Could not write lock holder info: {e}");
        }

        log::debug!("Acquired migration lock {}", self.path.display());
        Ok(guard)
    }

    /// Contents of the sentinel, if one exists.
    pub fn holder(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }
}

impl LockGuard {
    /// Sentinel path held by this guard.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the sentinel now, reporting any error.
    pub fn release(mut self) -> MigrateResult<()> {
        self.released = true;
        remove_sentinel(&self.path)
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_sentinel(&self.path) {
            log::warn!("{e}");
        }
    }
}

fn remove_sentinel(path: &Path) -> MigrateResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Released migration lock {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(MigrateError::io(path, e)),
    }
}

/// Remove a stale sentinel left by a crashed run.
///
/// Returns `true` if a sentinel was removed, `false` if none existed. Only
/// call this when no other process is migrating the same database.
pub fn force_unlock(path: &Path) -> MigrateResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::warn!("Removed migration lock {}", path.display());
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MigrateError::io(path, e)),
    }
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
