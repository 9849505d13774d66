//! Storage traits and error types
//!
//! This module defines the trait interface record sinks implement and the
//! associated error type.

use crate::storage::Record;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Table {path} has an unexpected header: {found}")]
    HeaderMismatch { path: PathBuf, found: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// An append-only destination for confirmed records
///
/// A sink has exactly one writer: the scanner of its region. Appends are
/// never deduplicated; that happens in the merge step.
pub trait RecordSink {
    /// Appends records in order and makes them durable before returning
    fn append(&mut self, records: &[Record]) -> StorageResult<()>;

    /// Number of record rows appended through this sink
    fn rows_appended(&self) -> u64;
}
