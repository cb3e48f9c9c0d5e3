//! Nhatot-Harvest main entry point
//!
//! Command-line interface for the incremental listing harvester.

use clap::Parser;
use nhatot_harvest::config::load_config;
use nhatot_harvest::crawler::crawl;
use nhatot_harvest::export::export_csv;
use nhatot_harvest::storage::AdStore;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Nhatot-Harvest: an incremental real-estate listing harvester
///
/// Crawls listing pages city by city, fetches each ad's detail document,
/// flattens it according to the configured mapping, and stores the rows
/// idempotently. Re-running is always safe: already-stored ads are skipped.
#[derive(Parser, Debug)]
#[command(name = "nhatot-harvest")]
#[command(version = "0.3.0")]
#[command(about = "Incremental real-estate listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with_all = ["stats", "export_only"])]
    dry_run: bool,

    /// Show stored-ad statistics and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_only"])]
    stats: bool,

    /// Export the stored table to CSV and exit (no crawling)
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_only {
        handle_export(&config)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("nhatot_harvest=info,warn"),
            1 => EnvFilter::new("nhatot_harvest=debug,info"),
            2 => EnvFilter::new("nhatot_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: validates config and shows the crawl plan
fn handle_dry_run(config: &nhatot_harvest::Config) {
    println!("=== Nhatot-Harvest Dry Run ===\n");

    let cities = config.resolved_cities();
    println!("Cities ({}):", cities.len());
    for city in &cities {
        println!("  - {} -> {}", city, config.city_base_url(city));
    }

    println!("\nCrawl:");
    println!(
        "  Pages {}..{} per city",
        config.crawl.start_page,
        config.crawl.start_page + config.crawl.max_pages - 1
    );
    println!("  Request delay: {}ms", config.crawl.request_delay_ms);
    println!("  Gateway: {}", config.source.gateway_base);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(csv_path) = &config.output.csv_path {
        println!("  CSV export: {}", csv_path);
    }

    let schema = nhatot_harvest::infer_schema(&config.mapping);
    println!("\nInferred schema ({} columns):", schema.len());
    for (name, column_type) in schema.columns() {
        println!("  {} {}", name, column_type.sql_type());
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --stats: prints stored-ad counts
fn handle_stats(config: &nhatot_harvest::Config) -> anyhow::Result<()> {
    let store = AdStore::new(&config.output.database_path);
    let count = store.count()?;
    println!("Database: {}", config.output.database_path);
    println!("Stored ads: {}", count);
    Ok(())
}

/// Handles --export-only: dumps the table to CSV without crawling
fn handle_export(config: &nhatot_harvest::Config) -> anyhow::Result<()> {
    let csv_path = config
        .output
        .csv_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--export-only requires output.csv-path in config"))?;
    let exported = export_csv(Path::new(&config.output.database_path), Path::new(csv_path))?;
    println!("Exported {} ads to {}", exported, csv_path);
    Ok(())
}

/// Handles the main crawl operation, then the optional CSV export
async fn handle_crawl(config: nhatot_harvest::Config) -> anyhow::Result<()> {
    let database_path = config.output.database_path.clone();
    let csv_path = config.output.csv_path.clone();

    let report = match crawl(config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Crawl complete: {} cities processed, {} new ads saved",
        report.cities_processed,
        report.total_saved
    );

    if let Some(csv_path) = csv_path {
        let exported = export_csv(Path::new(&database_path), Path::new(&csv_path))?;
        tracing::info!("Completed! Check '{}' ({} rows)", csv_path, exported);
    }

    Ok(())
}
