//! Table schema shared by the payload extractor and the table writers
//!
//! Both sides read the subject list from here, so a row written to disk
//! always lines up with the header above it.

/// Column holding the identifier; the merge step deduplicates on it
pub const KEY_COLUMN: &str = "SBD";

/// Column holding the region id reported by the endpoint
pub const REGION_COLUMN: &str = "TinhId";

/// Score fields, in table order
pub const SUBJECT_FIELDS: [&str; 14] = [
    "TOAN",
    "VAN",
    "NGOAI_NGU",
    "LI",
    "HOA",
    "SINH",
    "SU",
    "DIA",
    "GIAO_DUC_CONG_DAN",
    "TIN_HOC",
    "CN_CONG_NGHIEP",
    "CN_NONG_NGHIEP",
    "GDKT_PL",
    "TONGDIEM",
];

/// Number of score fields in a record
pub const SUBJECT_COUNT: usize = SUBJECT_FIELDS.len();

/// Value written for a score the endpoint did not report
pub const ABSENT_SCORE: &str = "-1";

/// UTF-8 byte order mark written at the start of every region table
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Full header row of a region table
pub fn header() -> Vec<&'static str> {
    let mut header = Vec::with_capacity(SUBJECT_COUNT + 2);
    header.push(KEY_COLUMN);
    header.push(REGION_COLUMN);
    header.extend_from_slice(&SUBJECT_FIELDS);
    header
}
