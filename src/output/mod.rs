//! Output module for sweep reports and table post-processing
//!
//! This module handles:
//! - Per-region and whole-sweep reports
//! - Merging region tables into one deduplicated, compressed table
//! - Drawing a reproducible sample from a results table

mod merge;
mod sample;
pub mod stats;

pub use merge::{merge_tables, MergeReport};
pub use sample::sample_table;
pub use stats::{print_report, CrawlReport, RegionFailure, RegionReport};

use crate::storage::schema::UTF8_BOM;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No tables found in {0}")]
    NoTables(PathBuf),

    #[error("Table {0} has no SBD column")]
    MissingKeyColumn(PathBuf),

    #[error("Table {0} has a different header than the tables before it")]
    HeaderMismatch(PathBuf),

    #[error("Cannot sample {requested} rows from a table of {available}")]
    NotEnoughRows { requested: usize, available: usize },
}

pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// Opens a table for reading, decompressing `.gz` files and skipping a leading BOM
pub(crate) fn open_csv(path: &Path) -> OutputResult<csv::Reader<Cursor<Vec<u8>>>> {
    let mut bytes = Vec::new();
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        GzDecoder::new(file).read_to_end(&mut bytes)?;
    } else {
        let mut file = file;
        file.read_to_end(&mut bytes)?;
    }

    if bytes.starts_with(UTF8_BOM) {
        bytes.drain(..UTF8_BOM.len());
    }

    Ok(csv::Reader::from_reader(Cursor::new(bytes)))
}
