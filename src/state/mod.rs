//! State module for tracking sweep progress
//!
//! # Components
//!
//! - `RegionScanState`: cursor, miss streak and confirmed count of one region
//! - `ScanPhase`: whether a region is still scanning or why it stopped
//! - `ScanLimits`: the stopping rules a scan is checked against

mod scan_state;

// Re-export main types
pub use scan_state::{RegionScanState, ScanLimits, ScanPhase, StopReason};
