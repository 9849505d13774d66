//! Region scanner
//!
//! Drives one region from its first serial until the miss streak or the
//! serial bound stops it. Batches run strictly one after another and each
//! productive batch is appended to the region table before the next batch
//! starts, so the table is always in ascending serial order.

use crate::config::CrawlerConfig;
use crate::crawler::executor::BatchExecutor;
use crate::crawler::fetcher::Probe;
use crate::identifier::RegionCode;
use crate::output::RegionReport;
use crate::state::{RegionScanState, ScanLimits, ScanPhase};
use crate::storage::{open_region_table, RecordSink};
use crate::SweepError;
use std::path::Path;
use std::time::Instant;

/// Scans regions through a shared batch executor
pub struct RegionScanner<'a, P> {
    executor: &'a BatchExecutor<P>,
    config: &'a CrawlerConfig,
    year: u16,
}

impl<'a, P: Probe> RegionScanner<'a, P> {
    pub fn new(executor: &'a BatchExecutor<P>, config: &'a CrawlerConfig, year: u16) -> Self {
        Self {
            executor,
            config,
            year,
        }
    }

    /// Scans `region` into its table inside `output_dir`
    ///
    /// The table is created with its header if it does not exist yet.
    pub async fn scan_region(
        &self,
        region: RegionCode,
        output_dir: &Path,
    ) -> Result<RegionReport, SweepError> {
        let mut table = open_region_table(output_dir, region)?;
        self.scan(region, &mut table).await
    }

    /// Scans `region`, streaming records into `sink`
    ///
    /// A storage failure aborts the scan; records appended before it stay
    /// in the sink.
    pub async fn scan<S: RecordSink + ?Sized>(
        &self,
        region: RegionCode,
        sink: &mut S,
    ) -> Result<RegionReport, SweepError> {
        let limits = ScanLimits::from(self.config);
        let batch_size = self.config.batch_size;
        let started = Instant::now();
        let mut state = RegionScanState::new(self.config.start_serial);

        tracing::info!("[{}] Scanning from serial {}", region, state.cursor);

        let stop_reason = loop {
            let start_serial = state.cursor;
            let batch = self
                .executor
                .run_batch(region, start_serial, batch_size, self.year)
                .await?;

            if !batch.records.is_empty() {
                sink.append(&batch.records)?;
                tracing::info!(
                    "[{}] Found {} records in batch {}",
                    region,
                    batch.records.len(),
                    start_serial
                );
            }

            tokio::time::sleep(self.config.inter_batch_delay()).await;

            if let ScanPhase::Stopped(reason) =
                state.record_batch(batch.records.len(), batch_size, &limits)
            {
                break reason;
            }
        };

        let last_serial = state.cursor.saturating_sub(1);
        tracing::info!(
            "[{}] Stopped ({}) at serial {} after {} batches: {} records",
            region,
            stop_reason,
            last_serial,
            state.batches,
            state.confirmed
        );

        Ok(RegionReport {
            region,
            records: state.confirmed,
            batches: state.batches,
            last_serial,
            stop_reason,
            elapsed: started.elapsed(),
        })
    }
}
