use serde::{Deserialize, Serialize};

use crate::error::{ChartError, ChartResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Space reserved on each side of a box, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    #[must_use]
    pub fn horizontal(self) -> f64 {
        self.left + self.right
    }

    #[must_use]
    pub fn vertical(self) -> f64 {
        self.top + self.bottom
    }

    pub fn validate(self) -> ChartResult<Self> {
        for (side, value) in [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "inset `{side}` must be finite and >= 0"
                )));
            }
        }
        Ok(self)
    }
}

/// Inner plotting frame: the area left after margin and padding.
///
/// `origin_*` is the absolute pixel position of the frame's top-left corner
/// inside the viewport. All chart geometry is computed in frame-local
/// coordinates and offset by the origin when emitted as primitives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotFrame {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotFrame {
    /// Resolves the inner frame of a viewport after removing margin and padding.
    pub fn resolve(viewport: Viewport, margin: Insets, padding: Insets) -> ChartResult<Self> {
        if !viewport.is_valid() {
            return Err(ChartError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let width = f64::from(viewport.width) - margin.horizontal() - padding.horizontal();
        let height = f64::from(viewport.height) - margin.vertical() - padding.vertical();
        if width <= 0.0 || height <= 0.0 {
            return Err(ChartError::InvalidConfig(format!(
                "margin and padding leave no plot area (inner {width}x{height})"
            )));
        }
        Ok(Self {
            origin_x: margin.left + padding.left,
            origin_y: margin.top + padding.top,
            width,
            height,
        })
    }

    #[must_use]
    pub fn to_absolute(self, x: f64, y: f64) -> (f64, f64) {
        (self.origin_x + x, self.origin_y + y)
    }
}
