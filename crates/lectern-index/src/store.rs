//! Where index metadata is kept.
//!
//! [`SidecarStore`] keeps the record as a JSON file inside the index
//! directory. [`MemoryStore`] is for embedding the guard in tests and in
//! index technologies that keep metadata themselves.

use crate::error::{IndexError, IndexResult};
use crate::metadata::IndexMetadata;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// File name of the sidecar record inside the index directory.
pub const METADATA_FILE_NAME: &str = "index_meta.json";

/// Collection-level metadata facility of an index.
pub trait IndexMetadataStore {
    /// Current record, `None` when the index was never stamped.
    fn read(&self) -> IndexResult<Option<IndexMetadata>>;

    /// Replace the record.
    fn write(&self, metadata: &IndexMetadata) -> IndexResult<()>;

    /// Remove the record. Returns whether one existed.
    fn clear(&self) -> IndexResult<bool>;

    /// Flag an existing record as incomplete. Returns whether one existed;
    /// nothing is written when there is no record.
    fn mark_incomplete(&self) -> IndexResult<bool> {
        match self.read()? {
            Some(mut metadata) => {
                if !metadata.incomplete {
                    metadata.incomplete = true;
                    self.write(&metadata)?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// JSON record at `<index dir>/index_meta.json`.
#[derive(Debug, Clone)]
pub struct SidecarStore {
    path: PathBuf,
}

impl SidecarStore {
    /// Store for the index living in `index_dir`.
    pub fn new(index_dir: &Path) -> Self {
        Self::at(index_dir.join(METADATA_FILE_NAME))
    }

    /// Store backed by an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexMetadataStore for SidecarStore {
    fn read(&self) -> IndexResult<Option<IndexMetadata>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IndexError::io(&self.path, e)),
        };
        let metadata = serde_json::from_str(&content).map_err(|source| IndexError::Json {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(metadata))
    }

    /// Write-to-temp-then-rename, so readers never see half a record.
    fn write(&self, metadata: &IndexMetadata) -> IndexResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| IndexError::io(parent, e))?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(metadata).map_err(|source| IndexError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&temp_path, json).map_err(|e| IndexError::io(&temp_path, e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| IndexError::io(&self.path, e))?;

        log::debug!("Wrote index metadata to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> IndexResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(IndexError::io(&self.path, e)),
        }
    }
}

/// In-process record. Counts writes so callers can assert on stamping.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: Mutex<Option<IndexMetadata>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already holding `metadata`.
    pub fn with(metadata: IndexMetadata) -> Self {
        Self {
            record: Mutex::new(Some(metadata)),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of [`write`](IndexMetadataStore::write) calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record(&self) -> MutexGuard<'_, Option<IndexMetadata>> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IndexMetadataStore for MemoryStore {
    fn read(&self) -> IndexResult<Option<IndexMetadata>> {
        Ok(self.record().clone())
    }

    fn write(&self, metadata: &IndexMetadata) -> IndexResult<()> {
        *self.record() = Some(metadata.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> IndexResult<bool> {
        Ok(self.record().take().is_some())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
