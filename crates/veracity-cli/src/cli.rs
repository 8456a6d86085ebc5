//! CLI command definitions and argument parsing.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Veracity CLI - Replay research runs and inspect verdict calibration.
#[derive(Debug, Parser)]
#[command(name = "veracity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (defaults to ~/.veracity/config.toml)
    #[arg(short, long, global = true, env = "VERACITY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a recorded fixture through the full engine
    Run(RunArgs),

    /// Rate a truth percentage on the band scale
    Rate(RateArgs),

    /// Show or initialise the configuration
    Config(ConfigArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Fixture file (JSON)
    #[arg(long)]
    pub fixture: PathBuf,

    /// Skip upstream-suggested queries so the run replays identically
    #[arg(long)]
    pub deterministic: bool,

    /// Reference date for date-windowed searches (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the rate command.
#[derive(Debug, Parser)]
pub struct RateArgs {
    /// Truth percentage (0-100)
    pub percentage: f64,

    /// Confidence (0-100)
    #[arg(short = 'n', long, default_value = "100")]
    pub confidence: f64,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Write the default configuration to the config path
    #[arg(long)]
    pub init: bool,

    /// Print the config path only
    #[arg(long, conflicts_with = "init")]
    pub path: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
