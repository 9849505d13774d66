use crate::storage::schema::{header, UTF8_BOM};
use crate::storage::traits::{RecordSink, StorageError, StorageResult};
use crate::storage::Record;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::Path;

/// Append-only CSV table for one region
///
/// A new table starts with a UTF-8 BOM and the header row; reopening an
/// existing table appends after its last row. Rows are flushed after every
/// append so a crash loses at most the batch in progress.
pub struct CsvTable {
    writer: csv::Writer<File>,
    rows_appended: u64,
}

impl CsvTable {
    /// Opens the table at `path`, creating it with a header if absent
    ///
    /// An existing table must carry the expected header.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let len = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        // A table cut short right after its BOM has no header yet
        let bom_only = len == UTF8_BOM.len() as u64 && fs::read(path)? == UTF8_BOM;
        let is_new = len == 0 || bom_only;
        if !is_new {
            check_header(path)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if len == 0 {
            file.write_all(UTF8_BOM)?;
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::CRLF)
            .from_writer(file);

        if is_new {
            writer.write_record(header())?;
            writer.flush()?;
            tracing::debug!("Created table {}", path.display());
        } else {
            tracing::debug!("Appending to existing table {}", path.display());
        }

        Ok(Self {
            writer,
            rows_appended: 0,
        })
    }
}

impl RecordSink for CsvTable {
    fn append(&mut self, records: &[Record]) -> StorageResult<()> {
        for record in records {
            self.writer.write_record(record.to_row())?;
        }
        self.writer.flush()?;
        self.rows_appended += records.len() as u64;
        Ok(())
    }

    fn rows_appended(&self) -> u64 {
        self.rows_appended
    }
}

/// Verifies the first line of an existing table against the schema header
fn check_header(path: &Path) -> StorageResult<()> {
    let mut first_line = String::new();
    BufReader::new(File::open(path)?).read_line(&mut first_line)?;

    let found = first_line
        .trim_start_matches('\u{feff}')
        .trim_end_matches(&['\r', '\n'][..]);

    if found != header().join(",") {
        return Err(StorageError::HeaderMismatch {
            path: path.to_path_buf(),
            found: found.to_string(),
        });
    }

    Ok(())
}
