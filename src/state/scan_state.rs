use crate::config::CrawlerConfig;
use std::fmt;

/// Why a region scan stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Too many consecutive identifiers without a record
    MissStreak,

    /// The cursor passed the upper bound of the serial range
    RangeExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissStreak => f.write_str("miss streak"),
            Self::RangeExhausted => f.write_str("range exhausted"),
        }
    }
}

/// Phase of a region scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Scanning,
    Stopped(StopReason),
}

impl ScanPhase {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped(_))
    }
}

/// Stopping rules of a region scan
#[derive(Debug, Clone, Copy)]
pub struct ScanLimits {
    pub max_consecutive_misses: u32,
    pub max_serial: u32,
}

impl From<&CrawlerConfig> for ScanLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_consecutive_misses: config.max_consecutive_misses,
            max_serial: config.max_serial,
        }
    }
}

/// Per-region scan state
///
/// Owned by exactly one scanner and threaded through its loop; every batch
/// outcome goes through [`RegionScanState::record_batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionScanState {
    /// Serial the next batch starts at
    pub cursor: u32,

    /// Identifiers probed since the last productive batch
    pub consecutive_misses: u32,

    /// Records confirmed so far in this region
    pub confirmed: u64,

    /// Batches run so far in this region
    pub batches: u32,

    pub phase: ScanPhase,
}

impl RegionScanState {
    pub fn new(start_serial: u32) -> Self {
        Self {
            cursor: start_serial,
            consecutive_misses: 0,
            confirmed: 0,
            batches: 0,
            phase: ScanPhase::Scanning,
        }
    }

    /// Folds the outcome of one batch into the state
    ///
    /// A batch with records resets the miss streak; an empty one extends it
    /// by the whole batch. The cursor always advances by `batch_size`.
    pub fn record_batch(&mut self, records: usize, batch_size: u32, limits: &ScanLimits) -> ScanPhase {
        self.batches += 1;

        if records > 0 {
            self.consecutive_misses = 0;
            self.confirmed += records as u64;
        } else {
            self.consecutive_misses = self.consecutive_misses.saturating_add(batch_size);
        }

        self.cursor = self.cursor.saturating_add(batch_size);

        if self.consecutive_misses >= limits.max_consecutive_misses {
            self.phase = ScanPhase::Stopped(StopReason::MissStreak);
        } else if self.cursor > limits.max_serial {
            self.phase = ScanPhase::Stopped(StopReason::RangeExhausted);
        }

        self.phase
    }
}
