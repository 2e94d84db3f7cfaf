//! Single-file Parquet loading with optional column projection.

use super::table::AgentTable;
use crate::error::LoadError;
use arrow::datatypes::Schema;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Rows decoded per record batch.
const READ_BATCH_ROWS: usize = 64 * 1024;

/// Load one agent file.
///
/// With `columns`, only the requested columns that exist in the file are
/// kept, in the requested order. If none of them exist the call fails with
/// [`LoadError::ColumnSelection`]. Every other failure is logged and turned
/// into `Ok(None)` so the caller can skip the file.
pub fn load_parquet_agents(
    path: &Path,
    columns: Option<&[String]>,
) -> Result<Option<AgentTable>, LoadError> {
    match read_parquet(path, columns) {
        Ok(table) => Ok(Some(table)),
        Err(err @ LoadError::ColumnSelection { .. }) => Err(err),
        Err(e) => {
            warn!("Error loading parquet file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Indices into `schema` of the requested columns that exist, in requested
/// order, without duplicates.
fn select_columns(schema: &Schema, requested: &[String]) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::with_capacity(requested.len());
    for name in requested {
        if let Ok(idx) = schema.index_of(name) {
            if !selected.contains(&idx) {
                selected.push(idx);
            }
        }
    }
    selected
}

fn read_parquet(path: &Path, columns: Option<&[String]>) -> Result<AgentTable, LoadError> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(READ_BATCH_ROWS);
    let file_schema = builder.schema().clone();

    let (builder, wanted) = match columns {
        None => (builder, None),
        Some(requested) => {
            let selected = select_columns(&file_schema, requested);
            if selected.is_empty() {
                return Err(LoadError::ColumnSelection {
                    path: path.to_path_buf(),
                    requested: requested.to_vec(),
                });
            }
            let names: Vec<String> = selected
                .iter()
                .map(|&i| file_schema.field(i).name().clone())
                .collect();
            let mask = ProjectionMask::roots(builder.parquet_schema(), selected);
            (builder.with_projection(mask), Some(names))
        }
    };

    let reader = builder.build()?;
    let read_schema = reader.schema();
    let batches = reader.collect::<Result<Vec<RecordBatch>, _>>()?;

    // The reader yields projected columns in file order.
    let table = match wanted {
        None => AgentTable::new(read_schema, batches),
        Some(names) => {
            let order = names
                .iter()
                .map(|n| read_schema.index_of(n))
                .collect::<Result<Vec<_>, _>>()?;
            AgentTable::new(read_schema, batches).project(&order)?
        }
    };

    debug!(
        "Loaded {} rows x {} columns from {}",
        table.num_rows(),
        table.num_columns(),
        path.display()
    );
    Ok(table)
}
