//! Index command implementation

use anyhow::{Context, Result};
use lectern_index::{inspect, IndexMetadataStore, IndexVerdict};
use serde::Serialize;

use crate::cli::{GlobalArgs, IndexArgs, IndexCommands, IndexStatusArgs, OutputFormat};
use crate::commands::common::{
    load_workspace, print_json, ExitCode, Workspace, EXIT_REBUILD_REQUIRED,
};

#[derive(Serialize)]
struct IndexStatusOutput<'a> {
    rebuild_required: bool,
    #[serde(flatten)]
    verdict: &'a IndexVerdict,
}

/// Execute the index command
pub async fn execute(args: &IndexArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = load_workspace(global)?;
    match &args.command {
        IndexCommands::Status(status_args) => execute_status(status_args, &workspace),
        IndexCommands::Invalidate => execute_invalidate(&workspace),
    }
}

fn execute_status(args: &IndexStatusArgs, workspace: &Workspace) -> Result<()> {
    let verdict = inspect(&workspace.index_store(), &workspace.expected_index());

    match args.output {
        OutputFormat::Json => print_json(&IndexStatusOutput {
            rebuild_required: verdict.requires_rebuild(),
            verdict: &verdict,
        })?,
        OutputFormat::Text => print_verdict(&verdict),
    }

    if verdict.requires_rebuild() {
        return Err(ExitCode(EXIT_REBUILD_REQUIRED).into());
    }
    Ok(())
}

fn execute_invalidate(workspace: &Workspace) -> Result<()> {
    let store = workspace.index_store();
    let flagged = store
        .mark_incomplete()
        .with_context(|| format!("Failed to update {}", store.path().display()))?;
    if flagged {
        println!("Index marked incomplete; it will be rebuilt before use");
    } else {
        println!("No index metadata found; the index already requires a build");
    }
    Ok(())
}

pub(crate) fn print_verdict(verdict: &IndexVerdict) {
    match verdict {
        IndexVerdict::Compatible => println!("Index is compatible"),
        IndexVerdict::Absent => println!("Index has not been built yet; rebuild required"),
        IndexVerdict::Incompatible(reasons) => {
            println!("Index is stale; rebuild required:");
            for reason in reasons {
                println!("  - {reason}");
            }
        }
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
