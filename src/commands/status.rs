//! Status command implementation
//!
//! Runs the same reconciliation pass as `apply` but never writes: each file
//! is reported with the verdict an apply would reach.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use regen::driver;
use regen::snapshot::SnapshotStore;

use super::{build_context, collect_generated_files, default_state_dir};

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory holding this run's generated output
    #[arg(short, long, value_name = "PATH", env = "REGEN_GENERATED")]
    pub generated: PathBuf,

    /// Working directory to compare against (defaults to current directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// State directory holding the previous generated snapshot
    #[arg(long, value_name = "PATH", env = "REGEN_STATE")]
    pub state: Option<PathBuf>,

    /// Only print files that would change
    #[arg(short, long)]
    pub changed: bool,
}

/// Execute the status command
pub fn execute(args: StatusArgs) -> Result<()> {
    let output_dir = args
        .output
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)?;
    let state_dir = args.state.unwrap_or_else(|| default_state_dir(&output_dir));
    let store = SnapshotStore::new(state_dir);

    let files = collect_generated_files(&args.generated)?;
    let context = build_context(&output_dir, &store, false)?;

    let report = driver::reconcile_all(&files, &context);

    for (_, operation) in &report.operations {
        let verdict = match (&operation.merged_contents, operation.has_conflict) {
            (None, _) => style("unchanged").dim(),
            (Some(_), true) => style("conflict ").yellow(),
            (Some(_), false) if operation.previous_relative_path.is_none() => {
                style("new      ").green()
            }
            (Some(_), false) => style("update   ").cyan(),
        };
        if args.changed && operation.merged_contents.is_none() {
            continue;
        }
        println!("{} {}", verdict, operation.relative_path.display());
    }

    for failure in &report.failures {
        println!(
            "{} {}: {}",
            style("error    ").red(),
            failure.relative_path.display(),
            failure.error
        );
    }

    let changed = report.writes().count();
    println!();
    println!(
        "{} file(s) would change, {} conflict(s), {} error(s)",
        changed,
        report.conflicts().count(),
        report.failures.len()
    );

    Ok(())
}
