//! Status command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{load_workspace, print_json};

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = load_workspace(global)?;
    let status = workspace.runner().status()?;

    if args.output == OutputFormat::Json {
        return print_json(&status);
    }

    println!("Database: {}", workspace.layout.database.display());
    println!("Schema version: {} (latest {})", status.current, status.latest);
    if status.is_up_to_date() {
        println!("No pending migrations");
    } else {
        println!("Pending migrations:");
        for unit in &status.pending {
            println!("  {}", unit.name);
        }
    }
    if status.locked {
        println!(
            "Migration lock is held: {}",
            workspace.layout.lock_file.display()
        );
    }
    Ok(())
}
