//! Salescope - Sales CSV Analytics Pipeline
//!
//! A CLI tool that ingests transactional sales CSV files and derives
//! dashboard-ready datasets: revenue by category, order value
//! distribution, discount impact, product performance, top customers,
//! and a narrative interpretation.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (invalid input, parse failure, empty batch, etc.)

mod analysis;
mod cli;
mod config;
mod ingest;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, Dataset, OutputFormat};
use config::Config;
use models::{CanonicalRecord, DashboardReport, Interpretation, RunMetadata};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    // Initialize logging
    init_logging(&args);

    info!("Salescope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    // Run the pipeline
    if let Err(e) = run_pipeline(args) {
        error!("Pipeline failed: {}", e);
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Handle --init-config: generate a default .salescope.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".salescope.toml");

    if path.exists() {
        eprintln!("⚠️  .salescope.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .salescope.toml")?;

    println!("✅ Created .salescope.toml with default settings.");
    println!("   Edit it to customize ranking sizes and the currency label.");
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

/// Run the complete pipeline: ingest, derive, write.
fn run_pipeline(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = args.input_path();

    // Step 1: Ingest and normalize
    println!("📥 Ingesting: {}", input.display());
    let records = ingest::read_records(&input)?;
    println!("   {} records normalized", records.len());

    // Step 2: Derive the requested datasets
    println!("📊 Deriving datasets...");
    let output = match args.dataset {
        Some(dataset) => render_dataset(dataset, &records, &config, args.format)?,
        None => match args.format {
            OutputFormat::Markdown => {
                report::generate_interpretation(&records, &config.report.currency)?
            }
            OutputFormat::Json => {
                let dashboard = build_dashboard(&records, &config, &input, &start_time)?;
                report::generate_json_report(&dashboard)?
            }
        },
    };

    // Step 3: Write the output
    std::fs::write(&args.output, &output)
        .with_context(|| format!("Failed to write output to {}", args.output.display()))?;

    println!(
        "\n✅ Done! Output saved to: {} ({:.1}s)",
        args.output.display(),
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

/// Derive all six datasets and assemble the dashboard document.
fn build_dashboard(
    records: &[CanonicalRecord],
    config: &Config,
    source: &Path,
    start_time: &Instant,
) -> Result<DashboardReport> {
    let categories = analysis::category_breakdown(records)?;
    let order_values = analysis::order_value_distribution(records)?;
    let discounts = analysis::discount_analysis(records)?;
    let products = analysis::product_performance(records, config.report.top_products)?;
    let customers = analysis::top_customers(records, config.report.top_customers)?;
    let interpretation = report::generate_interpretation(records, &config.report.currency)?;

    let metadata = RunMetadata {
        source_file: source.display().to_string(),
        generated_at: Utc::now(),
        record_count: records.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    Ok(DashboardReport {
        metadata,
        categories,
        order_values,
        discounts,
        products,
        customers,
        interpretation,
    })
}

/// Serialize one dataset on its own, mirroring the per-widget surface.
fn render_dataset(
    dataset: Dataset,
    records: &[CanonicalRecord],
    config: &Config,
    format: OutputFormat,
) -> Result<String> {
    let json = match dataset {
        Dataset::Categories => {
            serde_json::to_string_pretty(&analysis::category_breakdown(records)?)?
        }
        Dataset::Orders => {
            serde_json::to_string_pretty(&analysis::order_value_distribution(records)?)?
        }
        Dataset::Discounts => {
            serde_json::to_string_pretty(&analysis::discount_analysis(records)?)?
        }
        Dataset::Products => serde_json::to_string_pretty(&analysis::product_performance(
            records,
            config.report.top_products,
        )?)?,
        Dataset::Customers => serde_json::to_string_pretty(&analysis::top_customers(
            records,
            config.report.top_customers,
        )?)?,
        Dataset::Summary => {
            let markdown = report::generate_interpretation(records, &config.report.currency)?;
            match format {
                OutputFormat::Markdown => markdown,
                OutputFormat::Json => {
                    serde_json::to_string_pretty(&Interpretation { markdown })?
                }
            }
        }
    };

    Ok(json)
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
            info!("Loaded default config from .salescope.toml");
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
