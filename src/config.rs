//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.popstats.toml` files. Every path and tuning knob the pipelines use is
//! carried here and passed down explicitly.

use crate::cli::{AgentsArgs, Args, HouseholdsArgs, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".popstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Agent loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Export settings.
    #[serde(default)]
    pub export: ExportConfig,

    /// Household dataset settings.
    #[serde(default)]
    pub household: HouseholdConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Default report format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "popstats_report.md".to_string()
}

/// Agent loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Parallel worker tasks per batch.
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,

    /// Files per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Extension of agent files.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Columns to load (all when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,

    /// Pending tables allowed before compaction (2 x num_workers when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_threshold: Option<usize>,

    /// Stop discovery after this many files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,

    /// Show a progress bar while loading.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            batch_size: default_batch_size(),
            extension: default_extension(),
            columns: None,
            flush_threshold: None,
            max_files: None,
            show_progress: true,
        }
    }
}

fn default_num_workers() -> usize {
    8
}

fn default_batch_size() -> usize {
    1000
}

fn default_extension() -> String {
    "parquet".to_string()
}

fn default_true() -> bool {
    true
}

/// Export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Rows per written chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Export destination; no export when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            output: None,
        }
    }
}

fn default_chunk_size() -> usize {
    crate::export::DEFAULT_CHUNK_SIZE
}

/// Household dataset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdConfig {
    /// Root of the synthetic household files (`<root>/<STATE>/<zcta>_household.<ext>`).
    #[serde(default = "default_synthetic_root")]
    pub synthetic_root: String,

    /// Root of the census-derived household files.
    #[serde(default = "default_real_root")]
    pub real_root: String,

    /// Extension of household files.
    #[serde(default = "default_household_extension")]
    pub extension: String,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            synthetic_root: default_synthetic_root(),
            real_root: default_real_root(),
            extension: default_household_extension(),
        }
    }
}

fn default_synthetic_root() -> String {
    "test/household".to_string()
}

fn default_real_root() -> String {
    "zcta_data/household".to_string()
}

fn default_household_extension() -> String {
    "csv".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge the global CLI flags into this configuration.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }
    }

    /// Merge `agents` subcommand flags.
    pub fn merge_agents_args(&mut self, args: &AgentsArgs) {
        if let Some(workers) = args.workers {
            self.loader.num_workers = workers;
        }
        if let Some(batch_size) = args.batch_size {
            self.loader.batch_size = batch_size;
        }
        if let Some(ref columns) = args.columns {
            self.loader.columns = Some(
                columns
                    .iter()
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(ref extension) = args.extension {
            self.loader.extension = extension.clone();
        }
        if let Some(threshold) = args.flush_threshold {
            self.loader.flush_threshold = Some(threshold);
        }
        if let Some(max_files) = args.max_files {
            self.loader.max_files = Some(max_files);
        }
        if args.no_progress {
            self.loader.show_progress = false;
        }
        if let Some(ref export) = args.export {
            self.export.output = Some(export.display().to_string());
        }
        if let Some(chunk_size) = args.chunk_size {
            self.export.chunk_size = chunk_size;
        }
    }

    /// Merge `households` subcommand flags.
    pub fn merge_households_args(&mut self, args: &HouseholdsArgs) {
        if let Some(ref root) = args.synthetic_root {
            self.household.synthetic_root = root.display().to_string();
        }
        if let Some(ref root) = args.real_root {
            self.household.real_root = root.display().to_string();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.loader.num_workers, 8);
        assert_eq!(config.loader.batch_size, 1000);
        assert_eq!(config.loader.extension, "parquet");
        assert_eq!(config.export.chunk_size, 1_000_000);
        assert!(config.loader.columns.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "agents.json"
format = "json"

[loader]
num_workers = 4
batch_size = 250
columns = ["age", "income"]
flush_threshold = 3

[household]
real_root = "data/household"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "agents.json");
        assert_eq!(config.general.format, OutputFormat::Json);
        assert_eq!(config.loader.num_workers, 4);
        assert_eq!(config.loader.batch_size, 250);
        assert_eq!(
            config.loader.columns,
            Some(vec!["age".to_string(), "income".to_string()])
        );
        assert_eq!(config.loader.flush_threshold, Some(3));
        assert!(config.loader.show_progress);
        assert_eq!(config.household.real_root, "data/household");
        assert_eq!(config.household.synthetic_root, "test/household");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[loader]"));
        assert!(toml_str.contains("[export]"));
        assert!(toml_str.contains("[household]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.loader.batch_size, 1000);
    }

    #[test]
    fn test_merge_agents_args_trims_columns() {
        let args = AgentsArgs {
            dir: std::path::PathBuf::from("output_v2/population"),
            workers: Some(4),
            batch_size: None,
            columns: Some(vec!["age".to_string(), " income ".to_string(), " ".to_string()]),
            extension: None,
            flush_threshold: None,
            max_files: None,
            export: None,
            chunk_size: None,
            no_progress: true,
        };

        let mut config = Config::default();
        config.merge_agents_args(&args);
        assert_eq!(
            config.loader.columns,
            Some(vec!["age".to_string(), "income".to_string()])
        );
        assert_eq!(config.loader.num_workers, 4);
        assert_eq!(config.loader.batch_size, 1000);
        assert!(!config.loader.show_progress);
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[export]\nchunk_size = 5000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.export.chunk_size, 5000);
        assert!(Config::load(&temp_dir.path().join("missing.toml")).is_err());
    }
}
