//! Banks ETL CLI: one run of the largest-banks job.
//!
//! Scrapes the ranking page, converts market caps with the rates file, writes
//! the CSV and the SQLite table, then prints the fixed query results.
//! Settings come from built-in defaults, the TOML file named by
//! `BANKS_ETL_CONFIG`, and the flags below, in that order.

use anyhow::{Context, Result};
use banks_core::{source_for, FileProgressLog};
use banks_runner::{ConfigOverrides, EtlConfig, Pipeline, RunSummary};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "banks-etl",
    about = "Scrape, convert and load the largest banks by market cap"
)]
struct Cli {
    /// Page URL or local HTML file holding the ranking table.
    #[arg(long)]
    url: Option<String>,

    /// Exchange-rate CSV (`Currency,Rate`).
    #[arg(long)]
    rates: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,

    /// CSV export destination.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            locator: self.url,
            rates_path: self.rates,
            db_path: self.db,
            output_csv_path: self.output,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    // Query tables are printed in full.
    if std::env::var_os("POLARS_FMT_MAX_COLS").is_none() {
        std::env::set_var("POLARS_FMT_MAX_COLS", "-1");
    }

    let config = EtlConfig::from_env()
        .context("failed to load configuration")?
        .with_overrides(cli.overrides());

    let source = source_for(&config.locator).context("failed to set up page source")?;
    let progress = FileProgressLog::new(&config.log_path);

    let summary = Pipeline::new(config, source.as_ref(), &progress)
        .run(&mut std::io::stdout())
        .context("ETL run failed")?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Run Summary ===");
    println!("Rows loaded:    {}", summary.rows);
    println!("Missing caps:   {}", summary.null_metrics);
    println!("CSV:            {}", summary.csv_path.display());
    println!(
        "Database:       {} (table {})",
        summary.db_path.display(),
        summary.table_name
    );
    match summary.average_gbp {
        Some(avg) => println!("Avg GBP (bn):   {avg:.2}"),
        None => println!("Avg GBP (bn):   n/a"),
    }
    println!("Top names:      {}", summary.top_names.join(", "));
}
