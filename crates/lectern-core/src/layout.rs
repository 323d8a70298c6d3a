//! Resolved on-disk layout of a Lectern installation

use std::path::PathBuf;

/// Absolute locations derived from a [`Config`](crate::Config) and a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    /// Project root the relative config paths were resolved against
    pub root: PathBuf,
    /// Data directory
    pub data_dir: PathBuf,
    /// Database file
    pub database: PathBuf,
    /// Auxiliary data directory archived by backups
    pub aux_dir: PathBuf,
    /// Backup output directory
    pub backups_dir: PathBuf,
    /// Migration lock sentinel
    pub lock_file: PathBuf,
    /// Migration directory override, if configured
    pub migrations_dir: Option<PathBuf>,
    /// Derived search index directory
    pub index_dir: PathBuf,
}
