use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::core::primitives::datetime_to_unix_millis;

/// Index of the first sample whose time is `>= target_millis`, searching
/// from `lo`.
#[must_use]
pub fn bisect_left(times: &[DateTime<Utc>], target_millis: f64, lo: usize) -> usize {
    let lo = lo.min(times.len());
    lo + times[lo..].partition_point(|time| datetime_to_unix_millis(*time) < target_millis)
}

/// Sample index range covering an inclusive time window, widened by one
/// sample on each side so a line does not stop short of the window edge.
#[must_use]
pub fn padded_window(times: &[DateTime<Utc>], window: (f64, f64)) -> Range<usize> {
    let (min_t, max_t) = if window.0 <= window.1 {
        window
    } else {
        (window.1, window.0)
    };
    let min_index = bisect_left(times, min_t, 0);
    let max_index = bisect_left(times, max_t, 0);
    min_index.saturating_sub(1)..times.len().min(max_index + 2)
}

/// Index of the sample nearest to `target_millis`.
///
/// Compares the two samples bracketing the target; ties go to the later one.
#[must_use]
pub fn nearest_index(times: &[DateTime<Utc>], target_millis: f64) -> Option<usize> {
    if times.is_empty() || !target_millis.is_finite() {
        return None;
    }
    let upper = bisect_left(times, target_millis, 1).min(times.len() - 1);
    let lower = upper.saturating_sub(1);
    let lower_distance = target_millis - datetime_to_unix_millis(times[lower]);
    let upper_distance = datetime_to_unix_millis(times[upper]) - target_millis;
    if lower_distance < upper_distance {
        Some(lower)
    } else {
        Some(upper)
    }
}
