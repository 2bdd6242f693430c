//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Regen - Reconcile generated output with a working codebase
#[derive(Parser, Debug)]
#[command(name = "regen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply a generated tree onto a working directory
    Apply(commands::apply::ApplyArgs),

    /// Report what an apply would do without writing anything
    Status(commands::status::StatusArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::new()
            .parse_filters(&self.log_level)
            .init();

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args),
            Commands::Status(args) => commands::status::execute(args),
        }
    }
}
