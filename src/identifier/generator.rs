use crate::identifier::{Identifier, RegionCode};
use crate::IdentifierResult;

/// Lazily yields `count` consecutive identifiers starting at `start_serial`
///
/// Stateless: the same arguments always yield the same sequence, so a scan
/// can restart from any serial. The serial cursor itself lives in
/// `RegionScanState`.
pub fn identifiers(
    region: RegionCode,
    start_serial: u32,
    count: u32,
    serial_width: usize,
) -> impl Iterator<Item = IdentifierResult<Identifier>> {
    (0..count).map(move |offset| {
        Identifier::build(region, start_serial.saturating_add(offset), serial_width)
    })
}
