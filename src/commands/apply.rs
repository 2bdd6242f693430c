//! Apply command implementation
//!
//! The apply command runs a full reconciliation pass:
//! 1. Load the generated tree and the working directory
//! 2. Load the previous generated snapshot from the state directory
//! 3. Reconcile every file in parallel
//! 4. Commit merged contents and conflict sidecars to the working tree
//! 5. Persist the new snapshot for the next run

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::time::Instant;

use regen::driver;
use regen::snapshot::SnapshotStore;

use super::{build_context, collect_generated_files, default_state_dir};

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Directory holding this run's generated output
    #[arg(short, long, value_name = "PATH", env = "REGEN_GENERATED")]
    pub generated: PathBuf,

    /// Working directory to apply onto (defaults to current directory)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// State directory holding the previous generated snapshot
    #[arg(long, value_name = "PATH", env = "REGEN_STATE")]
    pub state: Option<PathBuf>,

    /// Reset every file to its generated contents, bypassing all merging
    #[arg(short, long)]
    pub force: bool,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs) -> Result<()> {
    let start_time = Instant::now();

    let output_dir = args
        .output
        .map(Ok)
        .unwrap_or_else(std::env::current_dir)?;
    let state_dir = args.state.unwrap_or_else(|| default_state_dir(&output_dir));
    let store = SnapshotStore::new(state_dir);

    if !args.quiet && args.dry_run {
        println!("🔎 DRY RUN MODE - No changes will be made");
        println!();
    }

    let files = collect_generated_files(&args.generated)?;
    let context = build_context(&output_dir, &store, args.force)?;

    let report = driver::reconcile_all(&files, &context);

    for operation in report.conflicts() {
        if !args.quiet {
            println!(
                "{} {}",
                style("⚠️  conflict:").yellow(),
                operation.relative_path.display()
            );
        }
    }
    for operation in report.deleted_in_working() {
        if !args.quiet {
            println!(
                "{} {} (deleted locally, regenerated)",
                style("⚠️  restored:").yellow(),
                operation.relative_path.display()
            );
        }
    }
    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            style("❌ failed:").red(),
            failure.relative_path.display(),
            failure.error
        );
    }

    if !args.dry_run {
        driver::commit(&report, &context)?;
        driver::persist_snapshot(&report, &store)?;
    }

    if !args.quiet {
        let written = report.writes().count();
        let unchanged = report.operations.len() - written;
        println!(
            "✅ Applied in {:.2}s: {} written, {} unchanged, {} conflicts",
            start_time.elapsed().as_secs_f64(),
            written,
            unchanged,
            report.conflicts().count()
        );
        if !args.dry_run && written > 0 {
            println!("   Files written to: {}", output_dir.display());
        }
    }

    if report.has_failures() {
        anyhow::bail!("{} file(s) failed to reconcile", report.failures.len());
    }

    Ok(())
}
