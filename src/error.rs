//! Error types for the loaders.
//!
//! The binary itself works with `anyhow::Result`; these enums describe the
//! failures callers of the loaders may want to match on.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading agent files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// None of the requested columns exist in the file.
    #[error("none of the requested columns {requested:?} found in {}", path.display())]
    ColumnSelection {
        path: PathBuf,
        requested: Vec<String>,
    },

    /// The agent directory does not exist or is not a directory.
    #[error("agent directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// Loader options that cannot produce a valid schedule.
    #[error("invalid loader options: {0}")]
    InvalidOptions(String),

    /// A table whose columns differ from the ones already collected.
    #[error("schema mismatch: expected [{expected}], found [{found}]")]
    SchemaMismatch { expected: String, found: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Errors raised while reading household datasets.
#[derive(Debug, Error)]
pub enum HouseholdError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to deserialize {}: {message}", path.display())]
    Deserialize { path: PathBuf, message: String },

    #[error("unsupported household data format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_selection_message() {
        let err = LoadError::ColumnSelection {
            path: PathBuf::from("agents/part-0.parquet"),
            requested: vec!["z".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"z\""));
        assert!(msg.contains("part-0.parquet"));
    }

    #[test]
    fn test_unsupported_format_message() {
        let err = HouseholdError::UnsupportedFormat(PathBuf::from("RI/02809_household.pkl"));
        assert!(err.to_string().contains("02809_household.pkl"));
    }
}
