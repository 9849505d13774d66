//! Crawler module for probing the score endpoint
//!
//! This module contains the core sweeping logic, including:
//! - Response decoding and record extraction
//! - HTTP fetching with a bounded retry policy
//! - Batch execution under a global concurrency limiter
//! - Per-region scanning with miss-streak termination
//! - Overall sweep coordination

mod coordinator;
mod executor;
mod fetcher;
pub mod payload;
pub mod retry;
mod scanner;

pub use coordinator::{run_crawl, Coordinator};
pub use executor::{BatchExecutor, BatchResult, Cooldown};
pub use fetcher::{build_http_client, FetchOutcome, Fetcher, HttpProbe, Probe};
pub use payload::Payload;
pub use retry::{RetryPolicy, RetryReason};
pub use scanner::RegionScanner;

use crate::config::Config;
use crate::output::CrawlReport;
use crate::SweepError;

/// Runs a complete sweep operation
///
/// This is the main entry point for starting a sweep. It will:
/// 1. Build the HTTP client and the concurrency limiter
/// 2. Create the output directory
/// 3. Scan every configured region in order, appending records as batches complete
/// 4. Return the per-region report
pub async fn crawl(config: Config) -> Result<CrawlReport, SweepError> {
    run_crawl(config).await
}
