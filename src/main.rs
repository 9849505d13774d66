//! SBD-Sweep main entry point
//!
//! This is the command-line interface for the SBD-Sweep registration-number sweeper.

use anyhow::Context;
use clap::Parser;
use sbd_sweep::config::{load_config_with_hash, validate, Config};
use sbd_sweep::crawler::crawl;
use sbd_sweep::identifier::RegionCode;
use sbd_sweep::output::{merge_tables, print_report, sample_table};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// SBD-Sweep: a polite registration-number sweeper
///
/// SBD-Sweep probes a score endpoint for every candidate registration number
/// of each region, stops a region once results dry up, and writes one CSV
/// table per region. Tables can then be merged and sampled.
#[derive(Parser, Debug)]
#[command(name = "sbd-sweep")]
#[command(version)]
#[command(about = "A polite registration-number sweeper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be swept without sending requests
    #[arg(long, conflicts_with_all = ["merge", "sample"])]
    dry_run: bool,

    /// Sweep only this region code (repeatable)
    #[arg(long = "region", value_name = "CODE")]
    regions: Vec<u32>,

    /// Merge the region tables into the consolidated table and exit
    #[arg(long, conflicts_with_all = ["dry_run", "sample"])]
    merge: bool,

    /// Draw a seeded random sample from TABLE and exit
    #[arg(long, value_name = "TABLE", conflicts_with_all = ["dry_run", "merge"])]
    sample: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    if !cli.regions.is_empty() {
        config.crawler.regions = cli.regions.clone();
    }
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.merge {
        handle_merge(&config)?;
    } else if let Some(input) = &cli.sample {
        handle_sample(&config, input)?;
    } else {
        handle_crawl(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sbd_sweep=info,warn"),
            1 => EnvFilter::new("sbd_sweep=debug,info"),
            2 => EnvFilter::new("sbd_sweep=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be swept
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== SBD-Sweep Dry Run ===\n");

    println!("Endpoint:");
    println!("  URL: {}", config.endpoint.base_url);
    println!("  Year: {}", config.endpoint.year);
    println!("  Request timeout: {}ms", config.endpoint.request_timeout_ms);

    println!("\nSweep:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Batch size: {}", config.crawler.batch_size);
    println!(
        "  Serials: {}..={} ({} digits)",
        config.crawler.start_serial, config.crawler.max_serial, config.crawler.serial_digits
    );
    println!(
        "  Miss streak limit: {}",
        config.crawler.max_consecutive_misses
    );
    println!(
        "  Cooldown: {}ms when over {:.0}% of a batch fails",
        config.crawler.cooldown_ms,
        config.crawler.rate_limit_threshold * 100.0
    );

    println!("\nRetry:");
    println!("  Attempts: {}", config.retry.max_attempts);
    println!("  Rate limit step: {}ms", config.retry.rate_limit_step_ms);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Merged table: {}", config.output.merged_path().display());

    let regions = config
        .crawler
        .regions
        .iter()
        .map(|&code| RegionCode::new(code).map(|r| r.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    println!("\nRegions ({}):", regions.len());
    println!("  {}", regions.join(" "));

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would probe at most {} identifiers",
        regions.len() as u64
            * u64::from(config.crawler.max_serial - config.crawler.start_serial + 1)
    );

    Ok(())
}

/// Handles the --merge mode: consolidates the region tables
fn handle_merge(config: &Config) -> anyhow::Result<()> {
    let output = config.output.merged_path();
    println!("=== Merging Region Tables ===\n");
    println!("Directory: {}", config.output.directory.display());
    println!("Output: {}", output.display());
    println!();

    let report = merge_tables(&config.output.directory, &output)?;

    println!("  Tables: {}", report.tables);
    println!("  Rows read: {}", report.rows_read);
    println!("  Rows written: {}", report.rows_written);
    println!("  Duplicates dropped: {}", report.duplicates);
    println!("\n✓ Merged table written to: {}", output.display());

    Ok(())
}

/// Handles the --sample mode: draws a seeded sample from a table
fn handle_sample(config: &Config, input: &Path) -> anyhow::Result<()> {
    let sample = &config.sample;
    let written = sample_table(input, &sample.output, sample.size, sample.seed)
        .with_context(|| format!("Failed to sample {}", input.display()))?;

    println!(
        "✓ Wrote {} sampled rows (seed {}) to: {}",
        written,
        sample.seed,
        sample.output.display()
    );

    Ok(())
}

/// Handles the main sweep operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Starting sweep of {} regions, batch size {}, concurrency {}",
        config.crawler.regions.len(),
        config.crawler.batch_size,
        config.crawler.concurrency
    );

    match crawl(config).await {
        Ok(report) => {
            tracing::info!("Sweep completed: {} records", report.total_records());
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}
