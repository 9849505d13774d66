//! Sweep reports
//!
//! This module collects what each region scan produced and prints the
//! end-of-run summary.

use crate::identifier::RegionCode;
use crate::state::StopReason;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Outcome of one completed region scan
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub region: RegionCode,

    /// Records appended to the region table
    pub records: u64,

    /// Batches run
    pub batches: u32,

    /// Last serial probed
    pub last_serial: u32,

    pub stop_reason: StopReason,

    pub elapsed: Duration,
}

/// A region whose scan was aborted
#[derive(Debug, Clone)]
pub struct RegionFailure {
    pub region: RegionCode,
    pub error: String,
}

/// Report of a whole sweep
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub regions: Vec<RegionReport>,
    pub failures: Vec<RegionFailure>,
}

impl CrawlReport {
    /// Starts an empty report stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            regions: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn total_records(&self) -> u64 {
        self.regions.iter().map(|r| r.records).sum()
    }

    pub fn total_batches(&self) -> u64 {
        self.regions.iter().map(|r| u64::from(r.batches)).sum()
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints a sweep report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Sweep Report ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = report.duration_seconds() {
        println!(
            "  Duration: {} seconds ({:.2} minutes)",
            seconds,
            seconds as f64 / 60.0
        );
    }
    println!("  Regions completed: {}", report.regions.len());
    println!("  Regions failed: {}", report.failures.len());
    println!("  Batches: {}", report.total_batches());
    println!("  Records: {}", report.total_records());
    println!();

    if !report.regions.is_empty() {
        println!("Regions:");
        for region in &report.regions {
            println!(
                "  {}: {} records, {} batches, last serial {} ({}, {:.1}s)",
                region.region,
                region.records,
                region.batches,
                region.last_serial,
                region.stop_reason,
                region.elapsed.as_secs_f64()
            );
        }
        println!();
    }

    if !report.failures.is_empty() {
        println!("Failed regions:");
        for failure in &report.failures {
            println!("  {}: {}", failure.region, failure.error);
        }
        println!();
    }
}
