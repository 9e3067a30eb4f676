use smallvec::SmallVec;

use crate::core::format_fixed;

/// Y-axis ticks at the extremes and centre of an extent.
///
/// Extremes are labelled with their value; the centre tick carries the
/// extent's range in parentheses.
#[derive(Debug, Clone, PartialEq)]
pub struct YAxisLabels {
    extent: (f64, f64),
    units: String,
}

impl YAxisLabels {
    #[must_use]
    pub fn new(extent: (f64, f64), units: impl Into<String>) -> Self {
        Self {
            extent,
            units: units.into(),
        }
    }

    #[must_use]
    pub fn extent(&self) -> (f64, f64) {
        self.extent
    }

    /// `[max, mean, min]`.
    #[must_use]
    pub fn ticks(&self) -> [f64; 3] {
        let (min, max) = self.extent;
        [max, min / 2.0 + max / 2.0, min]
    }

    #[must_use]
    pub fn label(&self, value: f64) -> String {
        let (min, max) = self.extent;
        if value == min || value == max {
            format!("{} {}", format_fixed(value, 1), self.units)
        } else {
            format!("({} {})", format_fixed(max - min, 1), self.units)
        }
    }

    #[must_use]
    pub fn labelled_ticks(&self) -> SmallVec<[(f64, String); 3]> {
        self.ticks()
            .into_iter()
            .map(|value| (value, self.label(value)))
            .collect()
    }
}
