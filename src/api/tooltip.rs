use chrono::{DateTime, Utc};

use crate::core::{Gap, format_iso_time_of_day};

/// Average glyph advance relative to font size, used to size tooltip boxes
/// without a text shaping backend.
const GLYPH_WIDTH_RATIO: f64 = 0.6;
const LINE_HEIGHT_RATIO: f64 = 1.2;

/// Text shown in a tooltip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TooltipContent {
    pub value: String,
    pub time: String,
}

impl TooltipContent {
    #[must_use]
    pub fn for_value(time: DateTime<Utc>, value: f64, units: &str) -> Self {
        Self {
            value: format!("{value} {units}"),
            time: format_iso_time_of_day(time),
        }
    }

    #[must_use]
    pub fn for_gap(gap: &Gap) -> Self {
        Self {
            value: "NO DATA".to_owned(),
            time: format!(
                "{} - {}",
                format_iso_time_of_day(gap.start),
                format_iso_time_of_day(gap.end)
            ),
        }
    }

    #[must_use]
    pub fn lines(&self) -> [&str; 2] {
        [&self.value, &self.time]
    }

    /// Approximate `(width, height)` of the tooltip box including padding.
    #[must_use]
    pub fn estimated_size(&self, font_size_px: f64, padding: f64) -> (f64, f64) {
        let widest = self
            .lines()
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        let width = widest as f64 * font_size_px * GLYPH_WIDTH_RATIO + 2.0 * padding;
        let height = self.lines().len() as f64 * font_size_px * LINE_HEIGHT_RATIO + 2.0 * padding;
        (width, height)
    }
}

/// Top-left corner for a tooltip anchored at `point` inside a frame of
/// `frame_size`.
///
/// The box sits `offset` pixels right of and below the point, and flips to
/// the other side on any axis where it would overflow. Returns `None` when
/// the flipped box still starts left of the frame.
#[must_use]
pub fn place_tooltip(
    point: (f64, f64),
    size: (f64, f64),
    frame_size: (f64, f64),
    offset: f64,
) -> Option<(f64, f64)> {
    let (mut x, mut y) = point;
    let (width, height) = size;

    x = if x + width > frame_size.0 {
        x - width - offset
    } else {
        x + offset
    };
    y = if y + height > frame_size.1 {
        y - height - offset
    } else {
        y + offset
    };

    (x >= 0.0).then_some((x, y))
}
