//! Command-line surface.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Spaced repetition over plain-text inbox files.
#[derive(Debug, Parser)]
#[command(name = "spaced-inbox", version, about)]
#[command(group(
    ArgGroup::new("mode")
        .args(["roll", "compile", "forecast", "import_legacy"])
        .multiple(false)
))]
pub struct Cli {
    /// File listing one inbox path per line.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Note database.
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Review-load CSV log.
    #[arg(long, value_name = "PATH")]
    pub review_load: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    pub log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Pick one due note and print its location.
    #[arg(long)]
    pub roll: bool,

    /// Print the locations of all due notes.
    #[arg(long)]
    pub compile: bool,

    /// Print how many notes fall due on each upcoming day.
    #[arg(long)]
    pub forecast: bool,

    /// Spread the forecast so no day exceeds N notes.
    #[arg(long, value_name = "N", requires = "forecast")]
    pub max_per_day: Option<usize>,

    /// Copy notes from a pre-2025 database, then exit.
    #[arg(long, value_name = "PATH")]
    pub import_legacy: Option<PathBuf>,
}
