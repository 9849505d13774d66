//! Registration number (SBD) handling
//!
//! An identifier is a two-digit region code followed by a zero-padded serial
//! number of fixed width, e.g. region `01` serial `42` at width 6 is
//! `01000042`.
//!
//! # Components
//!
//! - `RegionCode`: a validated administrative region code
//! - `Identifier`: a rendered identifier that remembers its parts
//! - `identifiers`: the lazy, restartable sequence of identifiers a batch probes

mod generator;

pub use generator::identifiers;

use crate::{IdentifierError, IdentifierResult};
use std::fmt;

/// Number of characters taken by the region part of an identifier
pub const REGION_WIDTH: usize = 2;

/// An administrative region code (1..=99, rendered with two digits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCode(u8);

impl RegionCode {
    pub fn new(code: u32) -> IdentifierResult<Self> {
        if (1..=99).contains(&code) {
            Ok(Self(code as u8))
        } else {
            Err(IdentifierError::RegionOutOfRange(code))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = REGION_WIDTH)
    }
}

/// A candidate registration number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    region: RegionCode,
    serial: u32,
    text: String,
}

impl Identifier {
    /// Builds the identifier for `serial` in `region`
    ///
    /// Fails only if the serial has more digits than `serial_width`.
    pub fn build(region: RegionCode, serial: u32, serial_width: usize) -> IdentifierResult<Self> {
        let text = format!("{}{:0width$}", region, serial, width = serial_width);
        if text.len() != REGION_WIDTH + serial_width {
            return Err(IdentifierError::SerialTooWide {
                serial,
                width: serial_width,
            });
        }
        Ok(Self {
            region,
            serial,
            text,
        })
    }

    /// Parses an identifier rendered with the given serial width
    pub fn parse(value: &str, serial_width: usize) -> IdentifierResult<Self> {
        let expected = REGION_WIDTH + serial_width;
        if value.len() != expected {
            return Err(IdentifierError::BadLength {
                value: value.to_string(),
                expected,
            });
        }
        if !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentifierError::NotNumeric(value.to_string()));
        }

        let (region, serial) = value.split_at(REGION_WIDTH);
        let region = region
            .parse::<u32>()
            .map_err(|_| IdentifierError::NotNumeric(value.to_string()))?;
        let serial = serial
            .parse::<u32>()
            .map_err(|_| IdentifierError::NotNumeric(value.to_string()))?;

        Ok(Self {
            region: RegionCode::new(region)?,
            serial,
            text: value.to_string(),
        })
    }

    pub fn region(&self) -> RegionCode {
        self.region
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.text
    }
}
