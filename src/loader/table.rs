//! In-memory agent tables and the append-only builder that merges them.

use crate::error::LoadError;
use arrow::array::ArrayRef;
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use tracing::debug;

/// A schema plus the record batches that make up its rows.
///
/// The rows of the table are the rows of each batch, in batch order.
#[derive(Debug, Clone)]
pub struct AgentTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl AgentTable {
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self { schema, batches }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::new(Arc::new(Schema::empty()), Vec::new())
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    /// Keep the columns at `indices`, in that order.
    pub fn project(&self, indices: &[usize]) -> Result<AgentTable, ArrowError> {
        let schema = Arc::new(self.schema.project(indices)?);
        let batches = self
            .batches
            .iter()
            .map(|b| b.project(indices))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AgentTable::new(schema, batches))
    }

    /// Every array holding a piece of column `index`, in row order.
    pub fn column_chunks(&self, index: usize) -> impl Iterator<Item = &ArrayRef> {
        self.batches.iter().map(move |b| b.column(index))
    }
}

/// Column names and types, formatted for error messages.
fn describe(schema: &Schema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| format!("{}: {}", f.name(), f.data_type()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Indices into `found` listing its columns in `expected` order, or `None`
/// unless both schemas hold the same column names with the same types.
fn column_order(expected: &Schema, found: &Schema) -> Option<Vec<usize>> {
    if expected.fields().len() != found.fields().len() {
        return None;
    }
    expected
        .fields()
        .iter()
        .map(|field| {
            let index = found.index_of(field.name()).ok()?;
            (found.field(index).data_type() == field.data_type()).then_some(index)
        })
        .collect()
}

/// The unified schema: same names and types, every field nullable, no metadata.
fn unified_schema(schema: &Schema) -> SchemaRef {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), f.data_type().clone(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Append-only builder for the unified table.
///
/// Tables are held as-is until more than `flush_threshold` are pending, at
/// which point they are compacted into a single record batch. Compacted
/// segments are never touched again, so each row is copied at most once
/// before `finish`.
pub struct TableBuilder {
    schema: Option<SchemaRef>,
    segments: Vec<RecordBatch>,
    pending: Vec<AgentTable>,
    flush_threshold: usize,
    flushes: usize,
}

impl TableBuilder {
    pub fn new(flush_threshold: usize) -> Self {
        Self {
            schema: None,
            segments: Vec::new(),
            pending: Vec::new(),
            flush_threshold: flush_threshold.max(1),
            flushes: 0,
        }
    }

    /// Add a table. The first table fixes the column names, types and order.
    /// Later tables are matched by column name and reordered to fit; tables
    /// whose names or types disagree are rejected and leave the builder
    /// unchanged.
    pub fn push(&mut self, table: AgentTable) -> Result<(), LoadError> {
        let table = match &self.schema {
            None => {
                self.schema = Some(unified_schema(table.schema()));
                table
            }
            Some(schema) => match column_order(schema, table.schema()) {
                None => {
                    return Err(LoadError::SchemaMismatch {
                        expected: describe(schema),
                        found: describe(table.schema()),
                    });
                }
                Some(order) if order.iter().enumerate().all(|(i, &j)| i == j) => table,
                Some(order) => table.project(&order)?,
            },
        };

        self.pending.push(table);
        if self.pending.len() > self.flush_threshold {
            self.flush()?;
        }
        Ok(())
    }

    /// Number of tables not yet compacted.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of compactions performed so far.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Compact all pending tables into one segment.
    pub fn flush(&mut self) -> Result<(), LoadError> {
        let Some(schema) = &self.schema else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }

        let merged = concat_batches(schema, self.pending.iter().flat_map(|t| t.batches()))?;
        debug!(
            "Compacted {} tables into one segment ({} rows)",
            self.pending.len(),
            merged.num_rows()
        );

        self.pending.clear();
        if merged.num_rows() > 0 {
            self.segments.push(merged);
        }
        self.flushes += 1;
        Ok(())
    }

    /// Compact what is left and return the unified table.
    ///
    /// A builder that never accepted a table yields [`AgentTable::empty`].
    pub fn finish(mut self) -> Result<AgentTable, LoadError> {
        self.flush()?;
        match self.schema {
            Some(schema) => Ok(AgentTable::new(schema, self.segments)),
            None => Ok(AgentTable::empty()),
        }
    }
}
