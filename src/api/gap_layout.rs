use chrono::{DateTime, Utc};

use crate::core::{Gap, LinearScale, datetime_to_unix_millis};
use crate::error::ChartResult;
use crate::render::{Color, RectPrimitive};

/// Pixel bounds of one gap, in plot-frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapBounds {
    pub gap: Gap,
    pub left: f64,
    pub right: f64,
    pub width: f64,
}

/// Gap rectangles for one render pass.
///
/// Horizontal bounds reach one sample beyond each end of the gap so the
/// rectangle meets the neighbouring line segments. The same cache serves
/// drawing and hover lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GapLayout {
    pub top: f64,
    pub bottom: f64,
    pub height: f64,
    gaps: Vec<GapBounds>,
}

impl GapLayout {
    pub fn compute(
        times: &[DateTime<Utc>],
        gaps: &[Gap],
        x_scale: LinearScale,
        y_scale: LinearScale,
    ) -> ChartResult<Self> {
        let (y_min, y_max) = y_scale.domain();
        let top = y_scale.map(y_max)?;
        let bottom = y_scale.map(y_min)?;
        let last = times.len().saturating_sub(1);

        let mut bounds = Vec::with_capacity(gaps.len());
        for gap in gaps {
            let first_index = gap.start_index.saturating_sub(1);
            let last_index = last.min(gap.end_index + 1);
            let left = x_scale.map(datetime_to_unix_millis(times[first_index]))?;
            let right = x_scale.map(datetime_to_unix_millis(times[last_index]))?;
            bounds.push(GapBounds {
                gap: *gap,
                left,
                right,
                width: right - left,
            });
        }

        Ok(Self {
            top,
            bottom,
            height: bottom - top,
            gaps: bounds,
        })
    }

    #[must_use]
    pub fn gaps(&self) -> &[GapBounds] {
        &self.gaps
    }

    /// Last gap starting at or before `index`.
    #[must_use]
    pub fn gap_for_index(&self, index: usize) -> Option<&GapBounds> {
        let after = self
            .gaps
            .partition_point(|bounds| bounds.gap.start_index <= index);
        after.checked_sub(1).map(|found| &self.gaps[found])
    }

    /// Rectangles clipped to a frame `width` pixels wide, offset by `origin`.
    #[must_use]
    pub fn rects(&self, origin: (f64, f64), width: f64, fill: Color) -> Vec<RectPrimitive> {
        self.gaps
            .iter()
            .filter_map(|bounds| {
                let left = bounds.left.max(0.0);
                let right = bounds.right.min(width);
                (right > left).then(|| {
                    RectPrimitive::new(
                        origin.0 + left,
                        origin.1 + self.top,
                        right - left,
                        self.height,
                        fill,
                    )
                })
            })
            .collect()
    }
}
