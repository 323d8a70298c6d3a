//! Force-unlock command implementation

use anyhow::Result;
use lectern_migrate::{force_unlock, LockManager};

use crate::cli::{ForceUnlockArgs, GlobalArgs};
use crate::commands::common::{load_workspace, ExitCode};

/// Execute the force-unlock command
pub async fn execute(args: &ForceUnlockArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = load_workspace(global)?;
    let lock = LockManager::new(&workspace.layout.lock_file);

    if !args.yes {
        match lock.holder() {
            Some(holder) => {
                println!("Migration lock held at {}:", lock.path().display());
                for line in holder.lines() {
                    println!("  {line}");
                }
                println!("Re-run with --yes once you are sure no migration is running.");
                return Err(ExitCode(1).into());
            }
            None => {
                println!("No migration lock at {}", lock.path().display());
                return Ok(());
            }
        }
    }

    if force_unlock(lock.path())? {
        println!("Removed migration lock {}", lock.path().display());
    } else {
        println!("No migration lock at {}", lock.path().display());
    }
    Ok(())
}

#[cfg(test)]
#[path = "force_unlock_test.rs"]
mod tests;
