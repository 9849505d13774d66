//! Consolidation of per-region tables
//!
//! Region tables are appended to without any uniqueness check, so the same
//! identifier can show up more than once (a region re-run, or two regions
//! reporting the same candidate). Merging is where duplicates go away.

use crate::output::{open_csv, OutputError, OutputResult};
use crate::storage::schema::KEY_COLUMN;
use csv::StringRecord;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Counters of one merge run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub tables: usize,
    pub rows_read: u64,
    pub rows_written: u64,
    pub duplicates: u64,
}

/// Merges every `*.csv` table in `dir` into a gzip-compressed table at `output`
///
/// Tables are read in file-name order and must share one header containing
/// the `SBD` column. The first row seen for an identifier survives; later
/// rows with the same identifier are dropped. A previous consolidated table
/// in `dir` (same name stem as `output`) is not read back in.
///
/// The table is written to a sibling `.tmp` file and renamed over `output`
/// only once complete, so a failed merge leaves any previous output intact.
pub fn merge_tables(dir: &Path, output: &Path) -> OutputResult<MergeReport> {
    let inputs = list_tables(dir, output)?;
    if inputs.is_empty() {
        return Err(OutputError::NoTables(dir.to_path_buf()));
    }

    let mut partial = output.as_os_str().to_owned();
    partial.push(".tmp");
    let partial = PathBuf::from(partial);

    match write_merged(&inputs, &partial) {
        Ok(report) => {
            fs::rename(&partial, output)?;
            tracing::info!(
                "Merged {} tables: {} rows read, {} written, {} duplicates dropped",
                report.tables,
                report.rows_read,
                report.rows_written,
                report.duplicates
            );
            Ok(report)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                tracing::warn!("Could not remove {}: {}", partial.display(), cleanup);
            }
            Err(e)
        }
    }
}

/// Writes the deduplicated rows of `inputs` as a gzip table at `path`
fn write_merged(inputs: &[PathBuf], path: &Path) -> OutputResult<MergeReport> {
    let encoder = GzEncoder::new(File::create(path)?, Compression::default());
    let mut writer = csv::Writer::from_writer(encoder);

    let mut report = MergeReport::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut expected_header: Option<StringRecord> = None;

    for path in inputs {
        let mut reader = open_csv(path)?;
        let header = reader.headers()?.clone();
        let key_index = header
            .iter()
            .position(|column| column == KEY_COLUMN)
            .ok_or_else(|| OutputError::MissingKeyColumn(path.clone()))?;

        match &expected_header {
            None => {
                writer.write_record(&header)?;
                expected_header = Some(header);
            }
            Some(expected) if *expected != header => {
                return Err(OutputError::HeaderMismatch(path.clone()));
            }
            Some(_) => {}
        }

        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            report.rows_read += 1;
            let key = record.get(key_index).unwrap_or_default();
            if seen.insert(key.to_string()) {
                writer.write_record(&record)?;
                report.rows_written += 1;
            } else {
                report.duplicates += 1;
            }
        }

        report.tables += 1;
        tracing::debug!("Merged {}", path.display());
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| OutputError::Io(e.into_error()))?;
    encoder.finish()?;

    Ok(report)
}

/// Lists the region tables of `dir`, sorted by name
fn list_tables(dir: &Path, output: &Path) -> OutputResult<Vec<PathBuf>> {
    let merged_stem = output
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or_default()
        .to_string();

    let mut tables = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|ext| ext == "csv");
        let is_merged = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| !merged_stem.is_empty() && stem == merged_stem);

        if path.is_file() && is_csv && !is_merged {
            tables.push(path);
        }
    }

    tables.sort();
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::{header, SUBJECT_COUNT, UTF8_BOM};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_table(dir: &Path, name: &str, keys: &[&str]) {
        let mut text = String::from_utf8(UTF8_BOM.to_vec()).unwrap();
        text.push_str(&header().join(","));
        text.push_str("\r\n");
        for key in keys {
            text.push_str(key);
            text.push_str(",1");
            for _ in 0..SUBJECT_COUNT {
                text.push_str(",-1");
            }
            text.push_str("\r\n");
        }
        fs::write(dir.join(name), text).unwrap();
    }

    fn read_gz_keys(path: &Path) -> Vec<String> {
        let mut text = String::new();
        GzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        reader
            .records()
            .map(|r| r.unwrap().get(0).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_merge_drops_duplicates() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "01.csv", &["01000001", "01000002", "01000002"]);
        write_table(dir.path(), "02.csv", &["02000001", "01000001"]);
        let output = dir.path().join("diem_thi_all.csv.gz");

        let report = merge_tables(dir.path(), &output).unwrap();

        assert_eq!(
            report,
            MergeReport {
                tables: 2,
                rows_read: 5,
                rows_written: 3,
                duplicates: 2,
            }
        );
        assert_eq!(
            read_gz_keys(&output),
            vec!["01000001", "01000002", "02000001"]
        );
    }

    #[test]
    fn test_merge_output_is_unique_for_overlapping_inputs() {
        let dir = TempDir::new().unwrap();
        let keys: Vec<String> = (0..40).map(|i| format!("01{:06}", i)).collect();
        // Each table overlaps the next by half of its rows
        for t in 0..6 {
            let slice: Vec<&str> = keys[t * 5..t * 5 + 10]
                .iter()
                .map(String::as_str)
                .collect();
            write_table(dir.path(), &format!("{:02}.csv", t + 1), &slice);
        }
        // And one table repeats everything
        let all: Vec<&str> = keys.iter().map(String::as_str).collect();
        write_table(dir.path(), "99.csv", &all);

        let output = dir.path().join("merged.csv.gz");
        merge_tables(dir.path(), &output).unwrap();

        let merged = read_gz_keys(&output);
        let unique: HashSet<&String> = merged.iter().collect();
        assert_eq!(unique.len(), merged.len());
        assert_eq!(merged.len(), 40);
    }

    #[test]
    fn test_previous_merge_is_not_an_input() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "01.csv", &["01000001"]);
        write_table(dir.path(), "diem_thi_all.csv", &["99999999"]);
        let output = dir.path().join("diem_thi_all.csv.gz");

        let report = merge_tables(dir.path(), &output).unwrap();
        assert_eq!(report.tables, 1);
        assert_eq!(read_gz_keys(&output), vec!["01000001"]);

        // Running again must not pick up its own output
        let again = merge_tables(dir.path(), &output).unwrap();
        assert_eq!(again.tables, 1);
    }

    #[test]
    fn test_leading_zeros_survive() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "01.csv", &["01000042"]);
        let output = dir.path().join("all.csv.gz");

        merge_tables(dir.path(), &output).unwrap();
        assert_eq!(read_gz_keys(&output), vec!["01000042"]);
    }

    #[test]
    fn test_failed_merge_keeps_previous_output() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "01.csv", &["01000001", "01000002"]);
        let output = dir.path().join("all.csv.gz");
        merge_tables(dir.path(), &output).unwrap();
        let before = fs::read(&output).unwrap();

        // Sorts first and fails the header check against 01.csv
        fs::write(dir.path().join("00.csv"), "SBD,TinhId\n00000001,2\n").unwrap();
        let result = merge_tables(dir.path(), &output);
        assert!(matches!(result, Err(OutputError::HeaderMismatch(_))));

        assert_eq!(fs::read(&output).unwrap(), before);
        assert_eq!(read_gz_keys(&output), vec!["01000001", "01000002"]);
        assert!(!dir.path().join("all.csv.gz.tmp").exists());
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let result = merge_tables(dir.path(), &dir.path().join("all.csv.gz"));
        assert!(matches!(result, Err(OutputError::NoTables(_))));
    }

    #[test]
    fn test_table_without_key_column() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("01.csv"), "id,name\n1,x\n").unwrap();
        let result = merge_tables(dir.path(), &dir.path().join("all.csv.gz"));
        assert!(matches!(result, Err(OutputError::MissingKeyColumn(_))));
    }

    #[test]
    fn test_mismatched_headers() {
        let dir = TempDir::new().unwrap();
        write_table(dir.path(), "01.csv", &["01000001"]);
        fs::write(dir.path().join("02.csv"), "SBD,TinhId\n02000001,2\n").unwrap();
        let result = merge_tables(dir.path(), &dir.path().join("all.csv.gz"));
        assert!(matches!(result, Err(OutputError::HeaderMismatch(_))));
    }
}
