//! Startup command implementation
//!
//! Runs the checks a Lectern process needs before serving requests: bring
//! the schema up to date, then make sure the search index can be queried.

use anyhow::Result;
use lectern_index::{inspect, IndexVerdict};
use lectern_migrate::{MigrationReport, RunOutcome};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::{GlobalArgs, OutputFormat, StartupArgs};
use crate::commands::common::{
    load_workspace, print_json, ExitCode, EXIT_IN_PROGRESS, EXIT_REBUILD_REQUIRED,
};
use crate::commands::index::print_verdict;
use crate::commands::migrate::{print_in_progress, print_report};

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum StartupState {
    Ready,
    MigrationInProgress,
    RebuildRequired,
}

#[derive(Serialize)]
struct StartupOutput {
    state: StartupState,
    #[serde(skip_serializing_if = "Option::is_none")]
    migration: Option<MigrationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lock_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<IndexVerdict>,
}

/// Execute the startup command
pub async fn execute(args: &StartupArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = load_workspace(global)?;
    let text = args.output == OutputFormat::Text;

    let report = match workspace.runner().run()? {
        RunOutcome::InProgress { lock_path } => {
            if text {
                print_in_progress(&lock_path);
            } else {
                print_json(&StartupOutput {
                    state: StartupState::MigrationInProgress,
                    migration: None,
                    lock_path: Some(lock_path),
                    index: None,
                })?;
            }
            return Err(ExitCode(EXIT_IN_PROGRESS).into());
        }
        RunOutcome::Completed(report) => report,
    };
    if text {
        print_report(&report, global.verbose);
    }

    let verdict = inspect(&workspace.index_store(), &workspace.expected_index());
    let state = if verdict.requires_rebuild() {
        StartupState::RebuildRequired
    } else {
        StartupState::Ready
    };

    if text {
        print_verdict(&verdict);
        if matches!(state, StartupState::Ready) {
            println!("Ready");
        }
    } else {
        print_json(&StartupOutput {
            state,
            migration: Some(report),
            lock_path: None,
            index: Some(verdict.clone()),
        })?;
    }

    if verdict.requires_rebuild() {
        return Err(ExitCode(EXIT_REBUILD_REQUIRED).into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "startup_test.rs"]
mod tests;
