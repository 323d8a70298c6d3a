//! Error types for the index guard

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by an [`IndexBuilder`](crate::IndexBuilder).
pub type BuildError = Box<dyn std::error::Error + Send + Sync>;

/// Index guard errors.
///
/// Compatibility checks never produce one of these; a stale or unreadable
/// index is an [`IndexVerdict`](crate::IndexVerdict).
#[derive(Error, Debug)]
pub enum IndexError {
    /// X001: A rebuild already holds the gate
    #[error("[X001] An index rebuild is already in progress")]
    RebuildInProgress,

    /// X002: The builder failed; no metadata was stamped
    #[error("[X002] Index build failed: {source}")]
    BuildFailed {
        #[source]
        source: BuildError,
    },

    /// X003: IO error with file path context
    #[error("[X003] I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// X004: Metadata record is not valid JSON
    #[error("[X004] Index metadata at {} is unreadable: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for IndexError
pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }
}
