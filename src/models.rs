//! Data models shared by the pipelines and the report generator.
//!
//! Table-level types live with the code that builds them (`loader`,
//! `analysis`, `household`); this module holds the run bookkeeping and the
//! report structure that ties them together.

use crate::analysis::AgentAnalysis;
use crate::household::HouseholdSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pipeline produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// Parallel agent-file loading and column statistics
    Agents,
    /// Household grouping and composition statistics
    Households,
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Agents => write!(f, "Agents"),
            Pipeline::Households => write!(f, "Households"),
        }
    }
}

/// Bookkeeping for one run of the agent loader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Directory that was scanned.
    pub base_dir: String,
    /// Number of matching files discovered.
    pub files_found: usize,
    /// Files whose rows made it into the unified table.
    pub files_loaded: usize,
    /// Files that were skipped because they failed to load.
    pub files_failed: usize,
    /// Number of batches processed.
    pub batches: usize,
    /// Number of intermediate compactions.
    pub compactions: usize,
    /// Rows in the unified table.
    pub total_rows: usize,
    /// Columns of the unified table.
    pub columns: Vec<String>,
    /// Wall-clock loading time in seconds.
    pub duration_seconds: f64,
}

impl LoadSummary {
    /// Share of discovered files that loaded, in percent.
    pub fn success_rate(&self) -> f64 {
        if self.files_found == 0 {
            return 0.0;
        }
        self.files_loaded as f64 / self.files_found as f64 * 100.0
    }
}

/// Outcome of an export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    /// Destination path.
    pub path: String,
    /// Rows per chunk.
    pub chunk_size: usize,
    /// Whether the export succeeded.
    pub success: bool,
}

/// Metadata about a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Pipeline that produced the report.
    pub pipeline: Pipeline,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Input location(s) as given on the command line.
    pub source: String,
    /// Total run time in seconds.
    pub duration_seconds: f64,
}

/// The complete report of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Loader bookkeeping (agents pipeline).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadSummary>,
    /// Column statistics (agents pipeline).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AgentAnalysis>,
    /// Export outcome, when an export was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportSummary>,
    /// Household summaries (households pipeline), one per dataset.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub households: Vec<HouseholdSummary>,
}

impl Report {
    /// Creates an empty report with the given metadata.
    pub fn new(metadata: ReportMetadata) -> Self {
        Self {
            metadata,
            load: None,
            analysis: None,
            export: None,
            households: Vec::new(),
        }
    }
}
