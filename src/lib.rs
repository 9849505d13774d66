//! SBD-Sweep: a polite registration-number sweeper
//!
//! This crate enumerates candidate registration numbers (SBD) region by region,
//! probes a remote score endpoint for each one, and streams the identifiers
//! that have records into one CSV table per region. Per-region tables can
//! afterwards be merged into a deduplicated, compressed table and sampled.

pub mod config;
pub mod crawler;
pub mod identifier;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for SBD-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Concurrency limiter was closed")]
    LimiterClosed,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Identifier-specific errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("Region code {0} is outside 1..=99")]
    RegionOutOfRange(u32),

    #[error("Serial {serial} does not fit in {width} digits")]
    SerialTooWide { serial: u32, width: usize },

    #[error("Identifier '{value}' must be {expected} characters long")]
    BadLength { value: String, expected: usize },

    #[error("Identifier '{0}' contains non-digit characters")]
    NotNumeric(String),
}

/// Result type alias for SBD-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for identifier operations
pub type IdentifierResult<T> = std::result::Result<T, IdentifierError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FetchOutcome};
pub use identifier::{Identifier, RegionCode};
pub use state::RegionScanState;
pub use storage::{Record, Score};
