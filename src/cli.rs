//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// PopStats - agent-file loader and household statistics
///
/// Load large directories of synthetic-population agent files in parallel,
/// summarize their numeric columns and export them, or compare synthetic and
/// census-derived household composition.
///
/// Examples:
///   popstats agents output_v2/population
///   popstats agents output_v2/population --workers 16 --columns age,income
///   popstats agents output_v2/population --export agents.parquet
///   popstats households --state RI --zcta 02809
///   popstats households --synthetic synth.csv --real real.csv --format json
///   popstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Pipeline to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .popstats.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .popstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load agent files in parallel, report column statistics, optionally export
    Agents(AgentsArgs),
    /// Group household datasets and report their composition
    Households(HouseholdsArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AgentsArgs {
    /// Directory containing agent files (searched recursively)
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Number of parallel workers per batch
    #[arg(short, long, value_name = "NUM", env = "POPSTATS_WORKERS")]
    pub workers: Option<usize>,

    /// Number of files per batch
    #[arg(long, value_name = "COUNT")]
    pub batch_size: Option<usize>,

    /// Columns to load (comma-separated)
    ///
    /// Example: --columns age,income,county
    #[arg(long, value_name = "COLS", value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// Extension of agent files
    #[arg(long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Loaded tables kept before merging them (default: 2 x workers)
    #[arg(long, value_name = "COUNT")]
    pub flush_threshold: Option<usize>,

    /// Maximum number of files to load
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Export the unified table to this file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Rows per chunk when exporting
    #[arg(long, value_name = "ROWS")]
    pub chunk_size: Option<usize>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HouseholdsArgs {
    /// Synthetic household file (.csv or .json)
    #[arg(long, value_name = "FILE", requires = "real", conflicts_with_all = ["state", "zcta"])]
    pub synthetic: Option<PathBuf>,

    /// Census-derived household file (.csv or .json)
    #[arg(long, value_name = "FILE", requires = "synthetic")]
    pub real: Option<PathBuf>,

    /// State abbreviation used to locate household files
    #[arg(long, value_name = "ST", requires = "zcta")]
    pub state: Option<String>,

    /// ZCTA code used to locate household files
    #[arg(long, value_name = "CODE", requires = "state")]
    pub zcta: Option<String>,

    /// Root directory of synthetic household files
    #[arg(long, value_name = "DIR")]
    pub synthetic_root: Option<PathBuf>,

    /// Root directory of census-derived household files
    #[arg(long, value_name = "DIR")]
    pub real_root: Option<PathBuf>,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            None => Err("A command is required: agents or households".to_string()),
            Some(Command::Agents(agents)) => agents.validate(),
            Some(Command::Households(households)) => households.validate(),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl AgentsArgs {
    fn validate(&self) -> Result<(), String> {
        if !self.dir.exists() {
            return Err(format!("Directory does not exist: {}", self.dir.display()));
        }
        if !self.dir.is_dir() {
            return Err(format!("Path is not a directory: {}", self.dir.display()));
        }

        if self.workers == Some(0) {
            return Err("Workers must be at least 1".to_string());
        }
        if self.batch_size == Some(0) {
            return Err("Batch size must be at least 1".to_string());
        }
        if self.flush_threshold == Some(0) {
            return Err("Flush threshold must be at least 1".to_string());
        }
        if self.chunk_size == Some(0) {
            return Err("Chunk size must be at least 1".to_string());
        }

        if let Some(ref columns) = self.columns {
            if columns.iter().all(|c| c.trim().is_empty()) {
                return Err("At least one column name is required with --columns".to_string());
            }
        }

        Ok(())
    }
}

impl HouseholdsArgs {
    fn validate(&self) -> Result<(), String> {
        let explicit = self.synthetic.is_some() && self.real.is_some();
        let located = self.state.is_some() && self.zcta.is_some();

        if !explicit && !located {
            return Err(
                "Provide either --synthetic and --real, or --state and --zcta".to_string(),
            );
        }

        Ok(())
    }
}
