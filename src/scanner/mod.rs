//! File scanner for discovering agent files.
//!
//! Walks an output directory recursively and returns every file whose
//! extension matches the configured one, sorted by file name at each level
//! so discovery order is stable between runs.

use crate::error::LoadError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for file scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extension to include, without the dot (e.g. "parquet")
    pub extension: String,
    /// Include dot-files and dot-directories
    pub include_hidden: bool,
    /// Maximum number of files to return
    pub max_files: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extension: "parquet".to_string(),
            include_hidden: false,
            max_files: None,
        }
    }
}

impl From<&crate::config::LoaderConfig> for ScanConfig {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            extension: config.extension.clone(),
            include_hidden: false,
            max_files: config.max_files,
        }
    }
}

/// Scanned file information.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Full path of the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// File scanner for discovering agent files.
pub struct FileScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Scan for all matching files.
    pub fn scan(&self) -> Result<Vec<ScannedFile>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::MissingDirectory(self.root.clone()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_excluded(entry.file_name()));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Cannot read entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(ScannedFile {
                path: entry.into_path(),
                size,
            });

            if let Some(max) = self.config.max_files {
                if files.len() >= max {
                    break;
                }
            }
        }

        Ok(files)
    }

    /// Check if a file has the configured extension.
    pub fn matches(&self, path: &Path) -> bool {
        let wanted = self.config.extension.trim_start_matches('.');
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    }

    fn is_excluded(&self, name: &OsStr) -> bool {
        !self.config.include_hidden && name.to_string_lossy().starts_with('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_scan_recursive_and_sorted() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b/part-1.parquet");
        touch(temp_dir.path(), "a/part-2.parquet");
        touch(temp_dir.path(), "a/nested/part-0.parquet");
        touch(temp_dir.path(), "a/notes.txt");

        let scanner = FileScanner::new(temp_dir.path().to_path_buf(), ScanConfig::default());
        let files = scanner.scan().unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(temp_dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a/nested/part-0.parquet"),
                PathBuf::from("a/part-2.parquet"),
                PathBuf::from("b/part-1.parquet"),
            ]
        );
    }

    #[test]
    fn test_hidden_entries_skipped() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), ".cache/part-0.parquet");
        touch(temp_dir.path(), "._part-1.parquet");
        touch(temp_dir.path(), "part-2.parquet");

        let scanner = FileScanner::new(temp_dir.path().to_path_buf(), ScanConfig::default());
        assert_eq!(scanner.scan().unwrap().len(), 1);

        let config = ScanConfig {
            include_hidden: true,
            ..ScanConfig::default()
        };
        let scanner = FileScanner::new(temp_dir.path().to_path_buf(), config);
        assert_eq!(scanner.scan().unwrap().len(), 3);
    }

    #[test]
    fn test_extension_match_ignores_case_and_dot() {
        let config = ScanConfig {
            extension: ".PARQUET".to_string(),
            ..ScanConfig::default()
        };
        let scanner = FileScanner::new(PathBuf::from("."), config);
        assert!(scanner.matches(Path::new("agents/part-0.parquet")));
        assert!(!scanner.matches(Path::new("agents/part-0.csv")));
        assert!(!scanner.matches(Path::new("agents/parquet")));
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = FileScanner::new(temp_dir.path().join("missing"), ScanConfig::default());
        assert!(matches!(scanner.scan(), Err(LoadError::MissingDirectory(_))));
    }

    #[test]
    fn test_max_files() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            touch(temp_dir.path(), &format!("part-{i}.parquet"));
        }
        let config = ScanConfig {
            max_files: Some(2),
            ..ScanConfig::default()
        };
        let scanner = FileScanner::new(temp_dir.path().to_path_buf(), config);
        assert_eq!(scanner.scan().unwrap().len(), 2);
    }
}
