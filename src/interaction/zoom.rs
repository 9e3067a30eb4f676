use serde::{Deserialize, Serialize};

use crate::core::LinearScale;
use crate::error::{ChartError, ChartResult};

/// Wheel delta units per doubling of the zoom scale.
const WHEEL_DELTA_PER_DOUBLING: f64 = 500.0;

/// Horizontal zoom as scale factor and pixel translation.
///
/// Applied to a base x scale, a pixel `p` of the zoomed view shows the base
/// domain value at pixel `(p - translate.0) / scale`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomTransform {
    pub scale: f64,
    pub translate: (f64, f64),
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomTransform {
    #[must_use]
    pub const fn identity() -> Self {
        Self {
            scale: 1.0,
            translate: (0.0, 0.0),
        }
    }

    #[must_use]
    pub const fn new(scale: f64, translate: (f64, f64)) -> Self {
        Self { scale, translate }
    }

    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::identity()
    }

    pub fn validate(self) -> ChartResult<Self> {
        if !self.scale.is_finite() || self.scale < 1.0 {
            return Err(ChartError::InvalidData(
                "zoom scale must be finite and >= 1".to_owned(),
            ));
        }
        if !self.translate.0.is_finite() || !self.translate.1.is_finite() {
            return Err(ChartError::InvalidData(
                "zoom translate must be finite".to_owned(),
            ));
        }
        Ok(self)
    }

    /// Returns the base scale with its domain narrowed to the zoomed view.
    pub fn rescale(self, base: LinearScale) -> ChartResult<LinearScale> {
        let (range_start, range_end) = base.range();
        let domain_start = base.invert((range_start - self.translate.0) / self.scale)?;
        let domain_end = base.invert((range_end - self.translate.0) / self.scale)?;
        base.with_domain((domain_start, domain_end))
    }
}

/// Keeps a horizontal translate inside the data span.
///
/// `x_span` is the pixel width of the full data extent at the current zoom;
/// the result satisfies `width - x_span <= translate <= 0`.
#[must_use]
pub fn clamp_pan_translate(translate_x: f64, width: f64, x_span: f64) -> f64 {
    translate_x.min(0.0).max(width - x_span)
}

/// Zoom gesture limits and math.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBehavior {
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for ZoomBehavior {
    fn default() -> Self {
        Self {
            min_scale: 1.0,
            max_scale: 50.0,
        }
    }
}

impl ZoomBehavior {
    pub fn validate(self) -> ChartResult<Self> {
        if !self.min_scale.is_finite()
            || !self.max_scale.is_finite()
            || self.min_scale < 1.0
            || self.max_scale < self.min_scale
        {
            return Err(ChartError::InvalidConfig(
                "zoom scale extent must satisfy 1 <= min <= max".to_owned(),
            ));
        }
        Ok(self)
    }

    #[must_use]
    pub fn clamp_scale(self, scale: f64) -> f64 {
        scale.clamp(self.min_scale, self.max_scale)
    }

    /// Wheel zoom about `anchor_x`; positive `delta` zooms out.
    #[must_use]
    pub fn wheel(self, current: ZoomTransform, anchor_x: f64, delta: f64, width: f64) -> ZoomTransform {
        let scale = self.clamp_scale(current.scale * (-delta / WHEEL_DELTA_PER_DOUBLING).exp2());
        let translate_x = anchor_x - (anchor_x - current.translate.0) * scale / current.scale;
        self.constrain(ZoomTransform::new(scale, (translate_x, current.translate.1)), width)
    }

    /// Drag pan by `dx` pixels.
    #[must_use]
    pub fn drag(self, current: ZoomTransform, dx: f64, width: f64) -> ZoomTransform {
        self.constrain(
            ZoomTransform::new(current.scale, (current.translate.0 + dx, current.translate.1)),
            width,
        )
    }

    /// Clamps scale to the limits and translate to the data span.
    ///
    /// The base domain always spans the full data extent across `width`, so
    /// the zoomed span is `width * scale`.
    #[must_use]
    pub fn constrain(self, transform: ZoomTransform, width: f64) -> ZoomTransform {
        let scale = self.clamp_scale(transform.scale);
        let translate_x = clamp_pan_translate(transform.translate.0, width, width * scale);
        ZoomTransform::new(scale, (translate_x, transform.translate.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rescale_narrows_domain() {
        let base = LinearScale::new((0.0, 100.0), (0.0, 200.0)).expect("valid scale");
        let zoomed = ZoomTransform::new(2.0, (-100.0, 0.0)).rescale(base).expect("valid scale");
        let (start, end) = zoomed.domain();
        assert_relative_eq!(start, 25.0);
        assert_relative_eq!(end, 75.0);
    }

    #[test]
    fn wheel_keeps_anchor_fixed() {
        let behavior = ZoomBehavior::default();
        let zoomed = behavior.wheel(ZoomTransform::identity(), 50.0, -500.0, 200.0);
        assert_relative_eq!(zoomed.scale, 2.0);
        assert_relative_eq!(zoomed.translate.0, -50.0);
    }

    #[test]
    fn wheel_out_at_identity_stays_identity() {
        let behavior = ZoomBehavior::default();
        let zoomed = behavior.wheel(ZoomTransform::identity(), 120.0, 800.0, 200.0);
        assert!(zoomed.is_identity());
    }
}
