//! Random sampling of report records

use super::record::ArrivalRecord;
use crate::error::{Result, TimestampError};
use rand::Rng;

/// Default number of samples picked from a report
pub const DEFAULT_SAMPLE_COUNT: usize = 8;

/// Pick `count` distinct indices in `0..len`, sorted ascending
pub fn pick_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, count: usize) -> Result<Vec<usize>> {
    if len == 0 {
        return Err(TimestampError::config("cannot sample from an empty report"));
    }
    if count > len {
        return Err(TimestampError::config(format!(
            "report has {} records, cannot pick {} distinct samples",
            len, count
        )));
    }

    let mut indices = rand::seq::index::sample(rng, len, count).into_vec();
    indices.sort_unstable();
    Ok(indices)
}

/// Pick `count` records at random, keeping their position in the report
pub fn sample_records<'a, R: Rng + ?Sized>(
    rng: &mut R,
    records: &'a [ArrivalRecord],
    count: usize,
) -> Result<Vec<(usize, &'a ArrivalRecord)>> {
    Ok(pick_indices(rng, records.len(), count)?
        .into_iter()
        .map(|idx| (idx, &records[idx]))
        .collect())
}

/// Format samples as `[index,value]|` pairs for one column
pub fn format_samples<F>(samples: &[(usize, &ArrivalRecord)], value: F) -> String
where
    F: Fn(&ArrivalRecord) -> i64,
{
    samples
        .iter()
        .map(|(idx, record)| format!("[{},{}]|", idx, value(*record)))
        .collect()
}
