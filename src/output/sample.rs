//! Seeded sampling of a results table

use crate::output::{open_csv, OutputError, OutputResult};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;

/// Writes `size` rows drawn uniformly without replacement from `input` to `output`
///
/// `input` may be a plain or gzip-compressed table. Rows keep their
/// original relative order. The same input, size and seed always select
/// the same rows. Returns the number of rows written.
pub fn sample_table(input: &Path, output: &Path, size: usize, seed: u64) -> OutputResult<usize> {
    let mut reader = open_csv(input)?;
    let header = reader.headers()?.clone();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

    if rows.len() < size {
        return Err(OutputError::NotEnoughRows {
            requested: size,
            available: rows.len(),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, rows.len(), size).into_vec();
    picked.sort_unstable();

    let mut writer = csv::Writer::from_writer(File::create(output)?);
    writer.write_record(&header)?;
    for i in &picked {
        writer.write_record(&rows[*i])?;
    }
    writer.flush()?;

    tracing::info!(
        "Sampled {} of {} rows from {} into {}",
        picked.len(),
        rows.len(),
        input.display(),
        output.display()
    );

    Ok(picked.len())
}
