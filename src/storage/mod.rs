//! Storage module for persisting confirmed records
//!
//! This module handles:
//! - The shared table schema (key column, region column, subject fields)
//! - The `Record` and `Score` types written to tables
//! - Append-only per-region CSV tables
//! - Region table naming inside the output directory

mod csv_table;
mod record;
pub mod schema;
mod traits;

pub use csv_table::CsvTable;
pub use record::{Record, Score};
pub use traits::{RecordSink, StorageError, StorageResult};

use crate::identifier::RegionCode;
use std::path::{Path, PathBuf};

/// Path of the table holding the records of `region`
pub fn region_table_path(dir: &Path, region: RegionCode) -> PathBuf {
    dir.join(format!("{}.csv", region))
}

/// Opens (or creates) the table of `region` inside `dir`
pub fn open_region_table(dir: &Path, region: RegionCode) -> StorageResult<CsvTable> {
    CsvTable::open(&region_table_path(dir, region))
}
