//! Batch execution under the global concurrency limiter
//!
//! A batch is a contiguous run of identifiers probed together. The limiter
//! bounds batches in flight, not individual requests: once a batch holds its
//! slot, all of its fetches run concurrently and the slot is released when
//! the last one finishes. A batch in which too many identifiers came back
//! without a record is taken as a sign of rate limiting and followed by a
//! cooldown.

use crate::crawler::fetcher::{FetchOutcome, Fetcher, Probe};
use crate::crawler::payload::extract_records;
use crate::crawler::retry::RetryPolicy;
use crate::identifier::{identifiers, RegionCode};
use crate::storage::Record;
use crate::{IdentifierResult, SweepError};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Records and miss count of one batch
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Records confirmed in this batch, in identifier order
    pub records: Vec<Record>,

    /// Identifiers that ended `Empty` or `Exhausted`
    pub non_success: u32,

    /// Number of identifiers dispatched
    pub dispatched: u32,

    /// Whether the batch was followed by a cooldown
    pub cooled_down: bool,
}

impl BatchResult {
    /// Share of dispatched identifiers without a record
    pub fn miss_ratio(&self) -> f64 {
        if self.dispatched == 0 {
            return 0.0;
        }
        f64::from(self.non_success) / f64::from(self.dispatched)
    }
}

/// Cooldown rule applied after every batch
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    /// Miss ratio at or above which the cooldown triggers
    pub threshold: f64,

    /// How long to pause
    pub duration: Duration,
}

/// Runs batches of fetches for any region
pub struct BatchExecutor<P> {
    fetcher: Fetcher<P>,
    limiter: Arc<Semaphore>,
    serial_width: usize,
    cooldown: Cooldown,
}

impl<P: Probe> BatchExecutor<P> {
    pub fn new(
        probe: P,
        policy: RetryPolicy,
        limiter: Arc<Semaphore>,
        serial_width: usize,
        cooldown: Cooldown,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(probe, policy),
            limiter,
            serial_width,
            cooldown,
        }
    }

    pub fn fetcher(&self) -> &Fetcher<P> {
        &self.fetcher
    }

    /// Probes `batch_size` identifiers of `region` starting at `start_serial`
    ///
    /// Fetch failures never surface here; they are counted as misses. Errors
    /// are limited to a closed limiter or a serial wider than the identifier
    /// format allows.
    pub async fn run_batch(
        &self,
        region: RegionCode,
        start_serial: u32,
        batch_size: u32,
        year: u16,
    ) -> Result<BatchResult, SweepError> {
        let batch = identifiers(region, start_serial, batch_size, self.serial_width)
            .collect::<IdentifierResult<Vec<_>>>()?;

        let outcomes = {
            let _permit = self
                .limiter
                .acquire()
                .await
                .map_err(|_| SweepError::LimiterClosed)?;
            join_all(batch.iter().map(|id| self.fetcher.fetch(id, year))).await
        };

        let mut result = BatchResult {
            dispatched: batch_size,
            ..BatchResult::default()
        };

        for (identifier, outcome) in batch.iter().zip(outcomes) {
            match outcome {
                FetchOutcome::Success { payload } => {
                    result.records.extend(extract_records(identifier, &payload));
                }
                FetchOutcome::Empty | FetchOutcome::Exhausted | FetchOutcome::Retryable { .. } => {
                    result.non_success += 1;
                }
            }
        }

        if result.miss_ratio() >= self.cooldown.threshold {
            tracing::warn!(
                "[{}] Batch {} had {}/{} misses, cooling down for {}s",
                region,
                start_serial,
                result.non_success,
                batch_size,
                self.cooldown.duration.as_secs()
            );
            tokio::time::sleep(self.cooldown.duration).await;
            result.cooled_down = true;
        }

        Ok(result)
    }
}
