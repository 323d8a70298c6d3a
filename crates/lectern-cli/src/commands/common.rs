//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use lectern_core::{AppLayout, Config};
use lectern_index::{ExpectedIndex, SidecarStore};
use lectern_migrate::MigrationRunner;
use serde::Serialize;
use std::fmt;

use crate::cli::GlobalArgs;

/// Exit code when another process holds the migration lock.
pub(crate) const EXIT_IN_PROGRESS: i32 = 2;

/// Exit code when the search index must be rebuilt before use.
pub(crate) const EXIT_REBUILD_REQUIRED: i32 = 3;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main.rs maps it to the process exit status.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Loaded configuration and the paths it resolves to.
pub(crate) struct Workspace {
    pub(crate) config: Config,
    pub(crate) layout: AppLayout,
}

impl Workspace {
    pub(crate) fn runner(&self) -> MigrationRunner {
        MigrationRunner::from_layout(&self.layout)
    }

    pub(crate) fn index_store(&self) -> SidecarStore {
        SidecarStore::new(&self.layout.index_dir)
    }

    pub(crate) fn expected_index(&self) -> ExpectedIndex {
        ExpectedIndex::from(&self.config.index)
    }
}

/// Load the config named by `--config`, or the project's `lectern.yml`
/// (defaults when absent), and resolve it against the project directory.
pub(crate) fn load_workspace(global: &GlobalArgs) -> Result<Workspace> {
    let root = &global.project_dir;
    let config = match &global.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_or_default(root)
            .with_context(|| format!("Failed to load config from {}", root.display()))?,
    };
    let layout = config.layout(root);
    log::debug!("Database: {}", layout.database.display());
    Ok(Workspace { config, layout })
}

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// Exit code carried by `err`, if it is an [`ExitCode`].
#[cfg(test)]
pub(crate) fn exit_code(err: &anyhow::Error) -> Option<i32> {
    err.downcast_ref::<ExitCode>().map(|code| code.0)
}
