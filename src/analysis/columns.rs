//! Per-column summary statistics over the unified agent table.

use crate::loader::AgentTable;
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::error::ArrowError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Mean, min and max of one numeric column, over its non-null values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub count: usize,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Statistics for one column, or the reason they could not be computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnReport {
    pub name: String,
    pub data_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ColumnStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`analyze_agents`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentAnalysis {
    pub total_agents: usize,
    /// One entry per numeric column, in schema order.
    pub columns: Vec<ColumnReport>,
}

impl AgentAnalysis {
    /// Columns whose statistics failed.
    pub fn failed_columns(&self) -> impl Iterator<Item = &ColumnReport> {
        self.columns.iter().filter(|c| c.error.is_some())
    }
}

/// Integer and floating-point columns qualify; everything else is skipped.
pub fn is_numeric(data_type: &DataType) -> bool {
    data_type.is_integer() || data_type.is_floating()
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn finish(self) -> ColumnStats {
        ColumnStats {
            count: self.count,
            mean: (self.count > 0).then(|| self.sum / self.count as f64),
            min: self.min,
            max: self.max,
        }
    }
}

fn column_stats(table: &AgentTable, index: usize) -> Result<ColumnStats, ArrowError> {
    let mut acc = Accumulator::default();

    for chunk in table.column_chunks(index) {
        let values = cast(chunk, &DataType::Float64)?;
        let values = values.as_primitive_opt::<Float64Type>().ok_or_else(|| {
            ArrowError::CastError(format!("{} did not cast to Float64", chunk.data_type()))
        })?;
        values.iter().flatten().for_each(|v| acc.push(v));
    }

    Ok(acc.finish())
}

/// Compute mean/min/max for every numeric column of `table`.
///
/// A column whose statistics fail is reported with its error and the
/// remaining columns are still processed.
pub fn analyze_agents(table: &AgentTable) -> AgentAnalysis {
    let total_agents = table.num_rows();
    info!("Total agents: {}", total_agents);

    let columns = table
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, field)| is_numeric(field.data_type()))
        .map(|(index, field)| {
            let mut report = ColumnReport {
                name: field.name().clone(),
                data_type: field.data_type().to_string(),
                stats: None,
                error: None,
            };
            match column_stats(table, index) {
                Ok(stats) => {
                    info!(
                        "{}: mean={:?} min={:?} max={:?}",
                        report.name, stats.mean, stats.min, stats.max
                    );
                    report.stats = Some(stats);
                }
                Err(e) => {
                    warn!("Could not compute statistics for {}: {}", report.name, e);
                    report.error = Some(e.to_string());
                }
            }
            report
        })
        .collect();

    AgentAnalysis {
        total_agents,
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::table::tests::agent_batch;
    use arrow::array::{Int32Array, UInt8Array};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    #[test]
    fn test_numeric_columns_only() {
        let batch = agent_batch(0, 4);
        let table = AgentTable::new(batch.schema(), vec![batch]);
        let analysis = analyze_agents(&table);

        assert_eq!(analysis.total_agents, 4);
        let names: Vec<_> = analysis.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "income"]);

        let id = analysis.columns[0].stats.unwrap();
        assert_eq!(id.count, 4);
        assert_eq!(id.mean, Some(1.5));
        assert_eq!(id.min, Some(0.0));
        assert_eq!(id.max, Some(3.0));

        let income = analysis.columns[1].stats.unwrap();
        assert_eq!(income.max, Some(4.5));
    }

    #[test]
    fn test_stats_span_batches_and_skip_nulls() {
        let schema = Arc::new(Schema::new(vec![Field::new("age", DataType::Int32, true)]));
        let first = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int32Array::from(vec![Some(10), None, Some(30)]))],
        )
        .unwrap();
        let second = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(Int32Array::from(vec![Some(-2), None]))],
        )
        .unwrap();
        let table = AgentTable::new(schema, vec![first, second]);

        let stats = analyze_agents(&table).columns[0].stats.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, Some(38.0 / 3.0));
        assert_eq!(stats.min, Some(-2.0));
        assert_eq!(stats.max, Some(30.0));
    }

    #[test]
    fn test_all_null_column() {
        let schema = Arc::new(Schema::new(vec![Field::new("flag", DataType::UInt8, true)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(UInt8Array::from(vec![None, None]))],
        )
        .unwrap();
        let table = AgentTable::new(schema, vec![batch]);

        let analysis = analyze_agents(&table);
        let report = &analysis.columns[0];
        assert!(report.error.is_none());
        assert_eq!(report.stats, Some(ColumnStats::default()));
    }

    #[test]
    fn test_empty_table() {
        let analysis = analyze_agents(&AgentTable::empty());
        assert_eq!(analysis.total_agents, 0);
        assert!(analysis.columns.is_empty());
        assert_eq!(analysis.failed_columns().count(), 0);
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric(&DataType::Float64));
        assert!(is_numeric(&DataType::UInt16));
        assert!(!is_numeric(&DataType::Utf8));
        assert!(!is_numeric(&DataType::Boolean));
    }
}
