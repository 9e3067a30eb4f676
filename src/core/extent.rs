use chrono::{DateTime, Utc};
use tracing::trace;

use crate::core::primitives::datetime_to_unix_millis;
use crate::core::windowing::padded_window;

/// Y range used when no finite sample exists anywhere in a series.
pub const DEFAULT_Y_EXTENT: (f64, f64) = (0.0, 1.0);

/// Full time range of a series, in epoch milliseconds.
#[must_use]
pub fn x_extent(times: &[DateTime<Utc>]) -> Option<(f64, f64)> {
    let first = times.first()?;
    let last = times.last()?;
    Some((datetime_to_unix_millis(*first), datetime_to_unix_millis(*last)))
}

/// Min/max over the finite values, skipping missing samples.
#[must_use]
pub fn finite_extent(values: &[Option<f64>]) -> Option<(f64, f64)> {
    values
        .iter()
        .flatten()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |extent, value| match extent {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}

/// Arithmetic mean over the finite values.
#[must_use]
pub fn finite_mean(values: &[Option<f64>]) -> Option<f64> {
    let finite = || values.iter().flatten().filter(|value| value.is_finite());
    let count = finite().count();
    (count > 0).then(|| finite().map(|value| value / count as f64).sum())
}

/// Y extent for the samples visible in `x_window`.
///
/// The window is widened by one sample on each side. Without a fixed size the
/// data extent is used, falling back to the full series and then to
/// [`DEFAULT_Y_EXTENT`]. With a fixed size, a window of that height is
/// centred on the windowed mean (0 when the window has no finite values).
#[must_use]
pub fn windowed_y_extent(
    times: &[DateTime<Utc>],
    values: &[Option<f64>],
    x_window: Option<(f64, f64)>,
    y_extent_size: Option<f64>,
) -> (f64, f64) {
    let windowed = match x_window {
        Some(window) => {
            let range = padded_window(times, window);
            &values[range.start.min(values.len())..range.end.min(values.len())]
        }
        None => values,
    };

    if let Some(size) = y_extent_size.filter(|size| size.is_finite() && *size > 0.0) {
        let mean = finite_mean(windowed).unwrap_or(0.0);
        return (mean - size / 2.0, mean + size / 2.0);
    }

    if let Some(extent) = finite_extent(windowed) {
        return extent;
    }
    if let Some(extent) = finite_extent(values) {
        trace!("no finite values in visible window, using full series extent");
        return extent;
    }
    trace!("no finite values in series, using default y extent");
    DEFAULT_Y_EXTENT
}

/// Adds `ratio` of the extent's height above and below it.
///
/// A zero-height extent is first widened to one unit so the result can back a
/// scale. Padding is clamped to the finite `f64` range; a non-finite extent
/// falls back to [`DEFAULT_Y_EXTENT`].
#[must_use]
pub fn padded_y_domain(extent: (f64, f64), ratio: f64) -> (f64, f64) {
    let (low, high) = if !extent.0.is_finite() || !extent.1.is_finite() {
        trace!(?extent, "non-finite y extent, using default");
        DEFAULT_Y_EXTENT
    } else if extent.0 == extent.1 {
        (extent.0 - 0.5, extent.1 + 0.5)
    } else {
        extent
    };
    let centre = low / 2.0 + high / 2.0;
    let half = (high / 2.0 - low / 2.0) * (1.0 + 2.0 * ratio);
    (
        (centre - half).max(f64::MIN),
        (centre + half).min(f64::MAX),
    )
}
