use crate::identifier::Identifier;
use crate::storage::schema::{ABSENT_SCORE, SUBJECT_COUNT};
use std::fmt;

/// A single subject score
///
/// `Absent` is distinct from a score of zero and is written as `-1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Value(f64),
    Absent,
}

impl Score {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::Absent => f.write_str(ABSENT_SCORE),
        }
    }
}

/// One confirmed result row
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The identifier that was requested
    pub identifier: Identifier,

    /// Region id as reported by the endpoint (may differ from the requested region)
    pub region_id: String,

    /// Scores in `SUBJECT_FIELDS` order
    pub scores: [Score; SUBJECT_COUNT],
}

impl Record {
    /// Renders the record as a table row matching `schema::header()`
    pub fn to_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(SUBJECT_COUNT + 2);
        row.push(self.identifier.to_string());
        row.push(self.region_id.clone());
        row.extend(self.scores.iter().map(Score::to_string));
        row
    }
}
