//! Crawler coordinator - sweep orchestration
//!
//! This module contains the top-level loop that:
//! - Builds the shared HTTP client and concurrency limiter
//! - Creates the output directory before any region starts
//! - Scans regions one after another, each to completion
//! - Collects per-region reports and isolates per-region failures

use crate::config::{validate, Config};
use crate::crawler::executor::{BatchExecutor, Cooldown};
use crate::crawler::fetcher::{build_http_client, HttpProbe, Probe};
use crate::crawler::retry::RetryPolicy;
use crate::crawler::scanner::RegionScanner;
use crate::identifier::RegionCode;
use crate::output::{CrawlReport, RegionFailure};
use crate::{ConfigError, SweepError};
use std::sync::Arc;
use tokio::sync::Semaphore;
use url::Url;

/// Main sweep coordinator
pub struct Coordinator<P = HttpProbe> {
    config: Config,
    regions: Vec<RegionCode>,
    executor: BatchExecutor<P>,
}

impl Coordinator<HttpProbe> {
    /// Creates a coordinator that probes the configured endpoint over HTTP
    pub fn new(config: Config) -> Result<Self, SweepError> {
        let base_url = Url::parse(&config.endpoint.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;
        let client = build_http_client(&config.endpoint)?;
        Self::with_probe(config, HttpProbe::new(client, base_url))
    }
}

impl<P: Probe> Coordinator<P> {
    /// Creates a coordinator around any probe
    ///
    /// The configuration is validated here, so hand-built configs get the
    /// same checks as parsed ones.
    pub fn with_probe(config: Config, probe: P) -> Result<Self, SweepError> {
        validate(&config)?;

        let regions = config
            .crawler
            .regions
            .iter()
            .map(|&code| RegionCode::new(code))
            .collect::<Result<Vec<_>, _>>()?;

        let limiter = Arc::new(Semaphore::new(config.crawler.concurrency as usize));
        let executor = BatchExecutor::new(
            probe,
            RetryPolicy::from(&config.retry),
            limiter,
            config.crawler.serial_digits,
            Cooldown {
                threshold: config.crawler.rate_limit_threshold,
                duration: config.crawler.cooldown(),
            },
        );

        Ok(Self {
            config,
            regions,
            executor,
        })
    }

    pub fn regions(&self) -> &[RegionCode] {
        &self.regions
    }

    /// Runs the sweep over every configured region, in order
    ///
    /// A region whose scan fails (its table cannot be written, for example)
    /// is recorded in the report and the sweep moves on to the next region.
    /// Only failing to create the output directory aborts the run.
    pub async fn run(&self) -> Result<CrawlReport, SweepError> {
        let output_dir = &self.config.output.directory;
        tokio::fs::create_dir_all(output_dir).await?;

        let mut report = CrawlReport::start();
        let scanner = RegionScanner::new(
            &self.executor,
            &self.config.crawler,
            self.config.endpoint.year,
        );

        tracing::info!(
            "Sweeping {} regions for year {} into {}",
            self.regions.len(),
            self.config.endpoint.year,
            output_dir.display()
        );

        for (index, &region) in self.regions.iter().enumerate() {
            match scanner.scan_region(region, output_dir).await {
                Ok(region_report) => report.regions.push(region_report),
                Err(e) => {
                    tracing::error!("[{}] Region scan aborted: {}", region, e);
                    report.failures.push(RegionFailure {
                        region,
                        error: e.to_string(),
                    });
                }
            }

            tracing::info!(
                "Progress: {}/{} regions, {} records so far",
                index + 1,
                self.regions.len(),
                report.total_records()
            );
        }

        report.finish();
        Ok(report)
    }
}

/// Runs a complete sweep over HTTP
///
/// # Example
///
/// ```no_run
/// use sbd_sweep::config::load_config;
/// use sbd_sweep::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sweep.toml"))?;
/// let report = run_crawl(config).await?;
/// println!("{} records", report.total_records());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> Result<CrawlReport, SweepError> {
    Coordinator::new(config)?.run().await
}
