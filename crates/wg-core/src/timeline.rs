//! Snapshot timeline attached to device output.
//!
//! Timestamps are never stored: they are derived from the run's start
//! time and a fixed sampling interval, one per output row.

use chrono::{Duration, NaiveDateTime};

use crate::{CoreError, CoreResult};

pub const SAMPLE_INTERVAL_MINUTES: i64 = 5;

pub fn sample_interval() -> Duration {
    Duration::minutes(SAMPLE_INTERVAL_MINUTES)
}

/// Generate `count` timestamps starting at `start`, spaced by
/// [`sample_interval`].
pub fn snapshot_timeline(start: NaiveDateTime, count: usize) -> CoreResult<Vec<NaiveDateTime>> {
    let step = sample_interval();
    let mut out = Vec::with_capacity(count);
    let mut current = start;
    for i in 0..count {
        if i > 0 {
            current = current
                .checked_add_signed(step)
                .ok_or(CoreError::TimelineOverflow { steps: i })?;
        }
        out.push(current);
    }
    Ok(out)
}
