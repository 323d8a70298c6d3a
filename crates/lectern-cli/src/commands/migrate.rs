//! Migrate command implementation

use anyhow::Result;
use lectern_migrate::{MigrationReport, MigrationStatus, RunOutcome};
use serde::Serialize;
use std::path::Path;

use crate::cli::{GlobalArgs, MigrateArgs, OutputFormat};
use crate::commands::common::{load_workspace, print_json, ExitCode, EXIT_IN_PROGRESS};

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum MigrateOutput<'a> {
    Applied { report: &'a MigrationReport },
    UpToDate { report: &'a MigrationReport },
    InProgress { lock_path: &'a Path },
    DryRun { plan: &'a MigrationStatus },
}

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let workspace = load_workspace(global)?;
    let runner = workspace.runner();

    if args.dry_run {
        let status = runner.status()?;
        return match args.output {
            OutputFormat::Json => print_json(&MigrateOutput::DryRun { plan: &status }),
            OutputFormat::Text => {
                print_plan(&status);
                Ok(())
            }
        };
    }

    match runner.run()? {
        RunOutcome::InProgress { lock_path } => {
            match args.output {
                OutputFormat::Json => print_json(&MigrateOutput::InProgress {
                    lock_path: &lock_path,
                })?,
                OutputFormat::Text => print_in_progress(&lock_path),
            }
            Err(ExitCode(EXIT_IN_PROGRESS).into())
        }
        RunOutcome::Completed(report) => {
            match args.output {
                OutputFormat::Json if report.applied.is_empty() => {
                    print_json(&MigrateOutput::UpToDate { report: &report })?
                }
                OutputFormat::Json => print_json(&MigrateOutput::Applied { report: &report })?,
                OutputFormat::Text => print_report(&report, global.verbose),
            }
            Ok(())
        }
    }
}

pub(crate) fn print_in_progress(lock_path: &Path) {
    println!("A migration is in progress, try again shortly.");
    println!(
        "If no migration is running, a previous run crashed: remove {} with `lectern force-unlock --yes`.",
        lock_path.display()
    );
}

pub(crate) fn print_report(report: &MigrationReport, verbose: bool) {
    if report.applied.is_empty() {
        println!("Schema is up to date (version {})", report.to_version);
        return;
    }

    if let Some(backup) = &report.backup {
        for artifact in backup.artifacts() {
            println!("  Backed up: {}", artifact.display());
        }
    }
    for unit in &report.applied {
        println!("  Applied: {} ({} ms)", unit.name, unit.duration_ms);
    }
    println!(
        "Migrated schema from version {} to {} ({} applied)",
        report.from_version,
        report.to_version,
        report.applied_count()
    );

    if verbose {
        let phases: Vec<String> = report.phases.iter().map(|p| p.to_string()).collect();
        println!("Phases: {}", phases.join(" -> "));
    }
}

fn print_plan(status: &MigrationStatus) {
    if status.pending.is_empty() {
        println!("Schema is up to date (version {})", status.current);
        return;
    }
    println!("Dry run - would apply the following migrations:");
    for unit in &status.pending {
        println!("  {}", unit.name);
    }
    println!(
        "Would migrate schema from version {} to {}",
        status.current, status.latest
    );
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
