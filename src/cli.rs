//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Salescope - sales CSV analytics pipeline for dashboard widgets
///
/// Ingest a transactional sales CSV and derive dashboard-ready datasets:
/// revenue by category, order value distribution, discount impact,
/// product performance, top customers, and a narrative summary.
///
/// Examples:
///   salescope --input sales.csv
///   salescope --input sales.csv --format markdown --output summary.md
///   salescope --input sales.csv --dataset categories
///   salescope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Sales CSV file to ingest
    ///
    /// Must carry a .csv extension. Column headers may use either the
    /// source spelling ("Product Category") or the canonical one
    /// ("productCategory"); unmapped columns are ignored.
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path
    #[arg(
        short,
        long,
        default_value = "salescope_dashboard.json",
        value_name = "FILE"
    )]
    pub output: PathBuf,

    /// Output format (json, markdown)
    ///
    /// json writes the full dashboard document; markdown writes only the
    /// narrative interpretation.
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Emit a single dataset as JSON instead of the full document
    ///
    /// Values: categories, orders, discounts, products, customers, summary
    #[arg(long, value_name = "NAME")]
    pub dataset: Option<Dataset>,

    /// Number of products kept by the performance ranking
    #[arg(long, value_name = "COUNT")]
    pub top_products: Option<usize>,

    /// Number of customers kept by the spend ranking
    #[arg(long, value_name = "COUNT")]
    pub top_customers: Option<usize>,

    /// Currency label for the narrative interpretation
    ///
    /// Can also be set via SALESCOPE_CURRENCY or .salescope.toml.
    #[arg(long, value_name = "LABEL", env = "SALESCOPE_CURRENCY")]
    pub currency: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .salescope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .salescope.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the derived data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Full dashboard document as JSON (default)
    #[default]
    Json,
    /// Narrative interpretation as Markdown
    Markdown,
}

/// A single derived dataset, mirroring the dashboard widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Dataset {
    /// Revenue by product category
    Categories,
    /// Order value distribution
    Orders,
    /// Discount impact analysis
    Discounts,
    /// Product performance ranking
    Products,
    /// Top customers table
    Customers,
    /// Narrative summary of headline metrics
    Summary,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the input path, empty if not set (validated first; an empty
    /// path is rejected again at ingestion).
    pub fn input_path(&self) -> PathBuf {
        self.input.clone().unwrap_or_default()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.input.is_none() {
            return Err("An input CSV file is required".to_string());
        }

        if let Some(top_products) = self.top_products {
            if top_products == 0 {
                return Err("--top-products must be at least 1".to_string());
            }
        }
        if let Some(top_customers) = self.top_customers {
            if top_customers == 0 {
                return Err("--top-customers must be at least 1".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.dataset.is_some() && self.format == OutputFormat::Markdown {
            if self.dataset != Some(Dataset::Summary) {
                return Err("--format markdown only applies to the summary dataset".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
