//! Chunked export of the unified agent table.

use crate::loader::AgentTable;
use anyhow::{bail, Context, Result};
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use tracing::{debug, error, info};

/// Default rows per written chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

fn writer_properties(chunk_size: usize) -> WriterProperties {
    WriterProperties::builder()
        .set_max_row_group_size(chunk_size)
        .set_created_by(format!("popstats {}", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Write `table` to `output_path` in slices of at most `chunk_size` rows.
/// Returns the number of rows written.
fn write_chunked(table: &AgentTable, output_path: &Path, chunk_size: usize) -> Result<usize> {
    if chunk_size == 0 {
        bail!("chunk size must be at least 1");
    }
    if table.num_columns() == 0 {
        bail!("table has no columns");
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut writer = ArrowWriter::try_new(
        file,
        table.schema().clone(),
        Some(writer_properties(chunk_size)),
    )
    .context("Failed to initialize parquet writer")?;

    let mut written = 0;
    for batch in table.batches() {
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = chunk_size.min(batch.num_rows() - offset);
            writer
                .write(&batch.slice(offset, len))
                .with_context(|| format!("Failed to write rows {}..{}", written, written + len))?;
            offset += len;
            written += len;
        }
        debug!("Exported {} rows", written);
    }

    writer.close().context("Failed to finalize parquet file")?;
    Ok(written)
}

/// Export `table` to a chunked Parquet file.
///
/// Returns `true` on success. Failures are logged, never raised.
pub fn export_table(table: &AgentTable, output_path: &Path, chunk_size: usize) -> bool {
    info!("Exporting table to {}", output_path.display());
    match write_chunked(table, output_path, chunk_size) {
        Ok(rows) => {
            info!("Successfully exported {} rows to {}", rows, output_path.display());
            true
        }
        Err(e) => {
            error!("Error exporting to {}: {:#}", output_path.display(), e);
            false
        }
    }
}
