//! Markdown and JSON report generation.
//!
//! This module renders the outcome of a run (loader bookkeeping, column
//! statistics, export result, household summaries) as a Markdown document
//! or as pretty-printed JSON.

use crate::analysis::{AgentAnalysis, ColumnReport};
use crate::household::HouseholdSummary;
use crate::models::{ExportSummary, LoadSummary, Report, ReportMetadata};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# PopStats Report\n\n");

    // Metadata section
    output.push_str(&generate_metadata_section(&report.metadata));

    // Loader bookkeeping
    if let Some(ref load) = report.load {
        output.push_str(&generate_load_section(load));
    }

    // Column statistics
    if let Some(ref analysis) = report.analysis {
        output.push_str(&generate_analysis_section(analysis));
    }

    // Export outcome
    if let Some(ref export) = report.export {
        output.push_str(&generate_export_section(export));
    }

    // Household composition
    if !report.households.is_empty() {
        output.push_str(&generate_households_section(&report.households));
    }

    // Footer
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Pipeline:** {}\n", metadata.pipeline));
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the loader section.
fn generate_load_section(load: &LoadSummary) -> String {
    let mut section = String::new();

    section.push_str("## Loading\n\n");
    section.push_str("| Files Found | Loaded | Failed | Batches | Compactions | Rows |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | **{}** |\n\n",
        load.files_found,
        load.files_loaded,
        load.files_failed,
        load.batches,
        load.compactions,
        load.total_rows
    ));

    if load.files_found > 0 {
        section.push_str(&format!(
            "*{:.1}% of files loaded in {:.1}s*\n\n",
            load.success_rate(),
            load.duration_seconds
        ));
    }

    if !load.columns.is_empty() {
        section.push_str(&format!(
            "**Columns:** {}\n\n",
            load.columns
                .iter()
                .map(|c| format!("`{}`", c))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    section
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}

fn column_row(column: &ColumnReport) -> String {
    match (&column.stats, &column.error) {
        (_, Some(error)) => format!(
            "| `{}` | {} | - | - | - | - | ⚠️ {} |\n",
            column.name, column.data_type, error
        ),
        (Some(stats), None) => format!(
            "| `{}` | {} | {} | {} | {} | {} | |\n",
            column.name,
            column.data_type,
            stats.count,
            format_stat(stats.mean),
            format_stat(stats.min),
            format_stat(stats.max)
        ),
        (None, None) => format!(
            "| `{}` | {} | - | - | - | - | |\n",
            column.name, column.data_type
        ),
    }
}

/// Generate the column statistics section.
fn generate_analysis_section(analysis: &AgentAnalysis) -> String {
    let mut section = String::new();

    section.push_str("## Agent Analysis\n\n");
    section.push_str(&format!("**Total agents:** {}\n\n", analysis.total_agents));

    if analysis.columns.is_empty() {
        section.push_str("No numeric columns to summarize.\n\n");
        return section;
    }

    section.push_str("### Column Statistics\n\n");
    section.push_str("| Column | Type | Count | Mean | Min | Max | Note |\n");
    section.push_str("|:---|:---|---:|---:|---:|---:|:---|\n");
    for column in &analysis.columns {
        section.push_str(&column_row(column));
    }
    section.push('\n');

    section
}

/// Generate the export section.
fn generate_export_section(export: &ExportSummary) -> String {
    let status = if export.success {
        "✅ exported"
    } else {
        "❌ failed"
    };
    format!(
        "## Export\n\n- **Path:** `{}`\n- **Chunk size:** {} rows\n- **Status:** {}\n\n",
        export.path, export.chunk_size, status
    )
}

/// Generate the household section, one column per dataset.
fn generate_households_section(summaries: &[HouseholdSummary]) -> String {
    let mut section = String::new();

    section.push_str("## Household Composition\n\n");

    section.push_str("| Metric |");
    for summary in summaries {
        section.push_str(&format!(" {} |", summary.label));
    }
    section.push('\n');
    section.push_str("|:---|");
    for _ in summaries {
        section.push_str("---:|");
    }
    section.push('\n');

    let rows: [(&str, fn(&HouseholdSummary) -> String); 6] = [
        ("Households", |s| s.households.to_string()),
        ("People", |s| s.people.to_string()),
        ("Average size", |s| format!("{:.3}", s.avg_size)),
        ("Average adults", |s| format!("{:.3}", s.avg_adults)),
        ("Average children", |s| format!("{:.3}", s.avg_kids)),
        ("Unclassified ages", |s| s.unclassified.to_string()),
    ];
    for (label, value) in rows {
        section.push_str(&format!("| {} |", label));
        for summary in summaries {
            section.push_str(&format!(" {} |", value(summary)));
        }
        section.push('\n');
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by PopStats v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
