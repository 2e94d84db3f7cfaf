//! PopStats - synthetic population loading and household statistics
//!
//! A CLI tool that loads large directories of agent files in parallel into a
//! single columnar table, summarizes and exports it, and compares synthetic
//! household composition against census-derived households.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing input, unreadable config, write failure, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod export;
mod household;
mod loader;
mod models;
mod report;
mod scanner;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{AgentsArgs, Args, Command, HouseholdsArgs, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use household::{group_households, load_house_data, GeographyKey, HouseholdSummary};
use models::{ExportSummary, Pipeline, Report, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("PopStats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match args.command.clone() {
        Some(Command::Agents(agents)) => run_agents(&args, &agents).await,
        Some(Command::Households(households)) => run_households(&args, &households),
        None => Ok(()),
    };

    if let Err(e) = result {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .popstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize workers, batch size, columns, and data roots.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Load, analyze and optionally export the agent files under `args.dir`.
async fn run_agents(global: &Args, args: &AgentsArgs) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(global)?;
    config.merge_with_args(global);
    config.merge_agents_args(args);

    let mut options = loader::LoaderOptions::from(&config.loader);
    if global.quiet {
        options.show_progress = false;
    }

    // Step 1: Load every agent file
    println!("📥 Loading agent files from: {}", args.dir.display());
    println!(
        "   Workers: {} | Batch size: {} | Flush threshold: {}",
        options.num_workers,
        options.batch_size,
        options.effective_flush_threshold()
    );
    if let Some(ref columns) = options.columns {
        println!("   Columns: {}", columns.join(", "));
    }

    let loaded = loader::load_agent_files(&args.dir, &options)
        .await
        .with_context(|| format!("Failed to load agent files from {}", args.dir.display()))?;

    if loaded.table.is_empty() {
        warn!("No agent rows were loaded from {}", args.dir.display());
    }

    // Step 2: Column statistics
    println!("\n🔬 Analyzing {} agents...", loaded.table.num_rows());
    let analysis = analysis::analyze_agents(&loaded.table);
    for failed in analysis.failed_columns() {
        warn!(
            "Statistics unavailable for column {}: {}",
            failed.name,
            failed.error.as_deref().unwrap_or("unknown error")
        );
    }

    // Step 3: Optional export
    let export = config.export.output.as_ref().map(|path| {
        println!("\n💾 Exporting to: {}", path);
        let success =
            export::export_table(&loaded.table, Path::new(path), config.export.chunk_size);
        ExportSummary {
            path: path.clone(),
            chunk_size: config.export.chunk_size,
            success,
        }
    });

    // Step 4: Build and save the report
    let duration = start_time.elapsed().as_secs_f64();
    let mut report = Report::new(ReportMetadata {
        pipeline: Pipeline::Agents,
        generated_at: Utc::now(),
        source: args.dir.display().to_string(),
        duration_seconds: duration,
    });
    let summary = loaded.summary;
    report.load = Some(summary.clone());
    report.analysis = Some(analysis);
    report.export = export.clone();

    let output_path = write_report(&report, &config)?;

    // Print summary
    println!("\n📊 Load Summary:");
    println!(
        "   Files: {} found | {} loaded | {} failed",
        summary.files_found, summary.files_loaded, summary.files_failed
    );
    println!(
        "   Rows: {} | Columns: {}",
        summary.total_rows,
        summary.columns.len()
    );
    println!(
        "   Batches: {} | Compactions: {}",
        summary.batches, summary.compactions
    );
    println!("   Duration: {:.1}s", duration);

    if let Some(ref export) = export {
        if !export.success {
            eprintln!("\n⚠️  Export to {} failed; see log for details.", export.path);
        }
    }

    println!(
        "\n✅ Loading complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Resolve the synthetic and real household files for a run.
fn household_paths(args: &HouseholdsArgs, config: &Config) -> (PathBuf, PathBuf) {
    if let (Some(synthetic), Some(real)) = (&args.synthetic, &args.real) {
        return (synthetic.clone(), real.clone());
    }

    let state = args.state.as_deref().unwrap_or_default();
    let zcta = args.zcta.as_deref().unwrap_or_default();
    let key = GeographyKey::new(state, zcta);
    let extension = &config.household.extension;

    (
        key.household_file(Path::new(&config.household.synthetic_root), extension),
        key.household_file(Path::new(&config.household.real_root), extension),
    )
}

/// Group both household datasets and report their composition side by side.
fn run_households(global: &Args, args: &HouseholdsArgs) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(global)?;
    config.merge_with_args(global);
    config.merge_households_args(args);

    let (synthetic_path, real_path) = household_paths(args, &config);

    // Step 1: Load both datasets
    println!("📥 Loading household data...");
    println!("   Synthetic: {}", synthetic_path.display());
    println!("   Real: {}", real_path.display());

    let (synthetic, real) =
        load_house_data(&synthetic_path, &real_path).context("Failed to load household data")?;

    // Step 2: Group and summarize
    println!("\n🔬 Grouping households...");
    let summaries = vec![
        HouseholdSummary::from_households("synthetic", &group_households(&synthetic)),
        HouseholdSummary::from_households("real", &group_households(&real)),
    ];

    // Step 3: Build and save the report
    let duration = start_time.elapsed().as_secs_f64();
    let mut report = Report::new(ReportMetadata {
        pipeline: Pipeline::Households,
        generated_at: Utc::now(),
        source: format!("{} | {}", synthetic_path.display(), real_path.display()),
        duration_seconds: duration,
    });
    report.households = summaries;

    let output_path = write_report(&report, &config)?;

    // Print summary
    println!("\n📊 Household Summary:");
    for summary in &report.households {
        println!(
            "   {:<10} households: {} | avg size: {:.2} | avg adults: {:.2} | avg kids: {:.2}",
            summary.label, summary.households, summary.avg_size, summary.avg_adults, summary.avg_kids
        );
        if summary.unclassified > 0 {
            println!(
                "   {:<10} {} people with an unrecognized age code",
                "", summary.unclassified
            );
        }
    }
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Households complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Render the report in the configured format and write it out.
fn write_report(report: &Report, config: &Config) -> Result<PathBuf> {
    println!("\n📝 Generating report...");

    let output = match config.general.format {
        OutputFormat::Json => report::generate_json_report(report)?,
        OutputFormat::Markdown => report::generate_markdown_report(report),
    };

    let path = PathBuf::from(&config.general.output);
    std::fs::write(&path, &output)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    Ok(path)
}
