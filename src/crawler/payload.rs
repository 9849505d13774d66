//! Decoding of endpoint responses into records
//!
//! The endpoint answers with `{"success": bool, "total": n, "data": [...]}`.
//! Each element of `data` is one result row carrying `TinhId` and any subset
//! of the subject fields. Fields the row does not carry become absent scores.

use crate::identifier::Identifier;
use crate::storage::schema::{REGION_COLUMN, SUBJECT_FIELDS};
use crate::storage::{Record, Score};
use serde_json::{Map, Value};

/// Rows of a response that reported a positive result count
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub total: u64,
    pub rows: Vec<Map<String, Value>>,
}

/// Decodes a response body
///
/// Returns `Ok(None)` for a well-formed answer that confirms there is no
/// record: a missing or false `success` flag, or a zero `total`. Only a body
/// that is not JSON at all is an error.
pub fn decode(body: &[u8]) -> Result<Option<Payload>, serde_json::Error> {
    let value: Value = serde_json::from_slice(body)?;
    let Some(object) = value.as_object() else {
        return Ok(None);
    };

    let success = object
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let total = object.get("total").and_then(Value::as_f64).unwrap_or(0.0);

    if !success || total <= 0.0 {
        return Ok(None);
    }

    let rows = object
        .get("data")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(|row| row.as_object().cloned()).collect())
        .unwrap_or_default();

    Ok(Some(Payload {
        total: total as u64,
        rows,
    }))
}

/// Turns every row of a payload into a record for `identifier`
///
/// One identifier may map to several rows. The record keeps the requested
/// identifier; the region id comes from the row and falls back to the
/// requested region.
pub fn extract_records(identifier: &Identifier, payload: &Payload) -> Vec<Record> {
    payload
        .rows
        .iter()
        .map(|row| Record {
            identifier: identifier.clone(),
            region_id: region_id(row).unwrap_or_else(|| identifier.region().to_string()),
            scores: SUBJECT_FIELDS.map(|field| score(row.get(field))),
        })
        .collect()
}

fn region_id(row: &Map<String, Value>) -> Option<String> {
    match row.get(REGION_COLUMN)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers and numeric strings are scores; anything else is absent
fn score(value: Option<&Value>) -> Score {
    match value {
        Some(Value::Number(n)) => n.as_f64().map_or(Score::Absent, Score::Value),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_or(Score::Absent, Score::Value),
        _ => Score::Absent,
    }
}
