//! Parallel agent-file loading.
//!
//! Files are discovered by the scanner, split into batches and per-worker
//! chunks, and loaded on tokio's blocking pool. Each batch is awaited in
//! full before the next one starts, and loaded tables are merged through a
//! [`TableBuilder`] so the number of live tables stays bounded.

pub mod plan;
pub mod reader;
pub mod table;

pub use plan::plan_batches;
pub use reader::load_parquet_agents;
pub use table::{AgentTable, TableBuilder};

use crate::error::LoadError;
use crate::models::LoadSummary;
use crate::scanner::{FileScanner, ScanConfig};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Options for [`load_agent_files`].
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Number of parallel worker tasks per batch.
    pub num_workers: usize,
    /// Number of files per batch.
    pub batch_size: usize,
    /// Columns to keep; `None` keeps all.
    pub columns: Option<Vec<String>>,
    /// Pending tables allowed before compaction; `None` means `2 * num_workers`.
    pub flush_threshold: Option<usize>,
    /// File discovery settings.
    pub scan: ScanConfig,
    /// Draw a progress bar over files.
    pub show_progress: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            num_workers: 8,
            batch_size: 1000,
            columns: None,
            flush_threshold: None,
            scan: ScanConfig::default(),
            show_progress: false,
        }
    }
}

impl LoaderOptions {
    /// Check that the options describe a runnable schedule.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.num_workers == 0 {
            return Err(LoadError::InvalidOptions(
                "num_workers must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(LoadError::InvalidOptions(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.flush_threshold == Some(0) {
            return Err(LoadError::InvalidOptions(
                "flush_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn effective_flush_threshold(&self) -> usize {
        self.flush_threshold.unwrap_or(self.num_workers * 2)
    }
}

impl From<&crate::config::LoaderConfig> for LoaderOptions {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            num_workers: config.num_workers,
            batch_size: config.batch_size,
            columns: config.columns.clone(),
            flush_threshold: config.flush_threshold,
            scan: ScanConfig::from(config),
            show_progress: config.show_progress,
        }
    }
}

/// The unified table plus bookkeeping about how it was built.
#[derive(Debug)]
pub struct LoadedAgents {
    pub table: AgentTable,
    pub summary: LoadSummary,
}

/// What one worker task hands back for its chunk.
#[derive(Default)]
struct ChunkOutput {
    tables: Vec<AgentTable>,
    failed: usize,
}

/// Load every file of a chunk in order, skipping the ones that fail.
fn process_file_chunk(
    files: &[PathBuf],
    columns: Option<&[String]>,
    progress: &ProgressBar,
) -> ChunkOutput {
    let mut output = ChunkOutput::default();

    for path in files {
        match load_parquet_agents(path, columns) {
            Ok(Some(table)) => output.tables.push(table),
            Ok(None) => output.failed += 1,
            Err(e) => {
                warn!("Error processing {}: {}", path.display(), e);
                output.failed += 1;
            }
        }
        progress.inc(1);
    }

    output
}

fn progress_bar(total: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Load and merge every agent file under `base_dir`.
///
/// A file that cannot be loaded is logged and skipped; it never aborts the
/// run. When nothing loads, the result is [`AgentTable::empty`].
pub async fn load_agent_files(
    base_dir: &Path,
    options: &LoaderOptions,
) -> Result<LoadedAgents, LoadError> {
    options.validate()?;
    let start_time = Instant::now();

    let scanner = FileScanner::new(base_dir.to_path_buf(), options.scan.clone());
    let scanned = scanner.scan()?;
    let total_bytes: u64 = scanned.iter().map(|f| f.size).sum();
    let all_files: Arc<Vec<PathBuf>> = Arc::new(scanned.into_iter().map(|f| f.path).collect());
    let total_files = all_files.len();
    info!(
        "Found {} {} files ({:.1} MiB) under {}",
        total_files,
        options.scan.extension,
        total_bytes as f64 / (1024.0 * 1024.0),
        base_dir.display()
    );

    let plans = plan_batches(total_files, options.batch_size, options.num_workers);
    let columns: Option<Arc<Vec<String>>> = options.columns.clone().map(Arc::new);
    let progress = progress_bar(total_files, options.show_progress);

    let mut builder = TableBuilder::new(options.effective_flush_threshold());
    let mut files_loaded = 0;
    let mut files_failed = 0;

    for plan in &plans {
        info!(
            "Processing batch {}/{}: {} files ({} to {})",
            plan.index + 1,
            plans.len(),
            plan.file_count(),
            plan.files.start,
            plan.files.end
        );

        let handles: Vec<_> = plan
            .chunks
            .iter()
            .cloned()
            .map(|range| {
                let files = Arc::clone(&all_files);
                let columns = columns.clone();
                let progress = progress.clone();
                tokio::task::spawn_blocking(move || {
                    let columns = columns.as_deref().map(|c| c.as_slice());
                    process_file_chunk(&files[range], columns, &progress)
                })
            })
            .collect();

        for (chunk, result) in plan.chunks.iter().zip(join_all(handles).await) {
            let output = match result {
                Ok(output) => output,
                Err(e) => {
                    error!(
                        "Worker for files {}..{} did not complete: {}",
                        chunk.start, chunk.end, e
                    );
                    files_failed += chunk.len();
                    continue;
                }
            };

            files_failed += output.failed;
            for table in output.tables {
                match builder.push(table) {
                    Ok(()) => files_loaded += 1,
                    Err(e @ LoadError::SchemaMismatch { .. }) => {
                        warn!("Skipping table from batch {}: {}", plan.index + 1, e);
                        files_failed += 1;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        debug!(
            "Batch {} done: {} pending tables, {} compactions",
            plan.index + 1,
            builder.pending(),
            builder.flushes()
        );
    }

    progress.finish_and_clear();

    info!("Concatenating final results...");
    let compactions = builder.flushes();
    let table = builder.finish()?;

    let summary = LoadSummary {
        base_dir: base_dir.display().to_string(),
        files_found: total_files,
        files_loaded,
        files_failed,
        batches: plans.len(),
        compactions,
        total_rows: table.num_rows(),
        columns: table.column_names(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    info!("Loaded {} total agents", summary.total_rows);

    Ok(LoadedAgents { table, summary })
}

#[cfg(test)]
mod tests {
    use super::reader::tests::write_parquet;
    use super::table::tests::{agent_batch, string_id_batch};
    use super::*;
    use tempfile::TempDir;

    fn options(num_workers: usize, batch_size: usize) -> LoaderOptions {
        LoaderOptions {
            num_workers,
            batch_size,
            ..LoaderOptions::default()
        }
    }

    /// Write `count` files with 1..=count rows each; returns the total row count.
    fn write_agent_files(root: &Path, count: usize) -> usize {
        let mut total = 0;
        for i in 0..count {
            let rows = i + 1;
            let dir = root.join(format!("county_{}", i % 4));
            write_parquet(
                &dir.join(format!("agents_{i:03}.parquet")),
                &[agent_batch(total as i64, rows)],
            );
            total += rows;
        }
        total
    }

    #[tokio::test]
    async fn test_loads_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let expected_rows = write_agent_files(temp_dir.path(), 25);

        let loaded = load_agent_files(temp_dir.path(), &options(3, 10)).await.unwrap();
        assert_eq!(loaded.table.num_rows(), expected_rows);
        assert_eq!(loaded.summary.files_found, 25);
        assert_eq!(loaded.summary.files_loaded, 25);
        assert_eq!(loaded.summary.files_failed, 0);
        assert_eq!(loaded.summary.batches, 3);
        assert!(loaded.summary.compactions >= 1);
    }

    #[tokio::test]
    async fn test_bad_files_contribute_no_rows() {
        let temp_dir = TempDir::new().unwrap();
        let expected_rows = write_agent_files(temp_dir.path(), 6);
        std::fs::write(temp_dir.path().join("county_0/broken.parquet"), b"garbage").unwrap();
        std::fs::write(temp_dir.path().join("truncated.parquet"), b"PAR1").unwrap();

        let loaded = load_agent_files(temp_dir.path(), &options(2, 4)).await.unwrap();
        assert_eq!(loaded.table.num_rows(), expected_rows);
        assert_eq!(loaded.summary.files_found, 8);
        assert_eq!(loaded.summary.files_loaded, 6);
        assert_eq!(loaded.summary.files_failed, 2);
    }

    #[tokio::test]
    async fn test_all_files_failing_yields_empty_table() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..3 {
            std::fs::write(temp_dir.path().join(format!("bad_{i}.parquet")), b"nope").unwrap();
        }

        let loaded = load_agent_files(temp_dir.path(), &options(2, 2)).await.unwrap();
        assert_eq!(loaded.table.num_rows(), 0);
        assert_eq!(loaded.table.num_columns(), 0);
        assert_eq!(loaded.summary.files_failed, 3);
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = load_agent_files(temp_dir.path(), &LoaderOptions::default())
            .await
            .unwrap();
        assert!(loaded.table.is_empty());
        assert_eq!(loaded.summary.batches, 0);
    }

    #[tokio::test]
    async fn test_column_projection_across_files() {
        let temp_dir = TempDir::new().unwrap();
        let expected_rows = write_agent_files(temp_dir.path(), 5);

        let opts = LoaderOptions {
            columns: Some(vec!["income".to_string(), "missing".to_string()]),
            ..options(2, 2)
        };
        let loaded = load_agent_files(temp_dir.path(), &opts).await.unwrap();
        assert_eq!(loaded.table.column_names(), vec!["income"]);
        assert_eq!(loaded.table.num_rows(), expected_rows);
    }

    #[tokio::test]
    async fn test_projection_without_match_skips_every_file() {
        let temp_dir = TempDir::new().unwrap();
        write_agent_files(temp_dir.path(), 3);

        let opts = LoaderOptions {
            columns: Some(vec!["z".to_string()]),
            ..options(2, 10)
        };
        let loaded = load_agent_files(temp_dir.path(), &opts).await.unwrap();
        assert!(loaded.table.is_empty());
        assert_eq!(loaded.summary.files_failed, 3);
    }

    #[tokio::test]
    async fn test_per_file_row_order_preserved() {
        let temp_dir = TempDir::new().unwrap();
        write_parquet(
            &temp_dir.path().join("only.parquet"),
            &[agent_batch(100, 7), agent_batch(107, 3)],
        );

        let loaded = load_agent_files(temp_dir.path(), &options(4, 10)).await.unwrap();
        let ids: Vec<i64> = loaded
            .table
            .column_chunks(0)
            .flat_map(|c| {
                c.as_any()
                    .downcast_ref::<arrow::array::Int64Array>()
                    .unwrap()
                    .values()
                    .to_vec()
            })
            .collect();
        assert_eq!(ids, (100..110).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_reordered_columns_are_merged_by_name() {
        let temp_dir = TempDir::new().unwrap();
        write_parquet(
            &temp_dir.path().join("a.parquet"),
            &[agent_batch(0, 3).project(&[0, 1]).unwrap()],
        );
        write_parquet(
            &temp_dir.path().join("b.parquet"),
            &[agent_batch(3, 2).project(&[1, 0]).unwrap()],
        );

        let loaded = load_agent_files(temp_dir.path(), &LoaderOptions::default())
            .await
            .unwrap();
        assert_eq!(loaded.table.num_rows(), 5);
        assert_eq!(loaded.table.column_names(), vec!["id", "income"]);
        assert_eq!(loaded.summary.files_loaded, 2);
        assert_eq!(loaded.summary.files_failed, 0);
    }

    #[tokio::test]
    async fn test_mixed_schemas_in_one_run() {
        let temp_dir = TempDir::new().unwrap();
        write_parquet(&temp_dir.path().join("a_first.parquet"), &[agent_batch(0, 4)]);
        write_parquet(
            &temp_dir.path().join("b_reordered.parquet"),
            &[agent_batch(4, 3).project(&[2, 0, 1]).unwrap()],
        );
        write_parquet(
            &temp_dir.path().join("c_string_ids.parquet"),
            &[string_id_batch(5)],
        );

        let loaded = load_agent_files(temp_dir.path(), &options(1, 10)).await.unwrap();
        assert_eq!(loaded.table.num_rows(), 7);
        assert_eq!(loaded.table.column_names(), vec!["id", "income", "county"]);
        assert_eq!(loaded.summary.files_found, 3);
        assert_eq!(loaded.summary.files_loaded, 2);
        assert_eq!(loaded.summary.files_failed, 1);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let result = tokio_test::block_on(load_agent_files(temp_dir.path(), &options(0, 10)));
        assert!(matches!(result, Err(LoadError::InvalidOptions(_))));

        let result = tokio_test::block_on(load_agent_files(temp_dir.path(), &options(4, 0)));
        assert!(matches!(result, Err(LoadError::InvalidOptions(_))));
    }

    #[test]
    fn test_default_flush_threshold() {
        assert_eq!(options(8, 1000).effective_flush_threshold(), 16);
        let opts = LoaderOptions {
            flush_threshold: Some(3),
            ..options(8, 1000)
        };
        assert_eq!(opts.effective_flush_threshold(), 3);
    }
}
