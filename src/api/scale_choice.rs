use serde::{Deserialize, Serialize};

/// Y-scale preference offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleChoice {
    /// Fit each chart to its visible data.
    #[default]
    Auto,
    Nt1000,
    Nt100,
    Nt10,
}

impl ScaleChoice {
    pub const ALL: [Self; 4] = [Self::Auto, Self::Nt1000, Self::Nt100, Self::Nt10];

    /// Fixed y window height, or `None` to auto-fit.
    #[must_use]
    pub fn extent_size(self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Nt1000 => Some(1000.0),
            Self::Nt100 => Some(100.0),
            Self::Nt10 => Some(10.0),
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::Nt1000 => "1,000 nT",
            Self::Nt100 => "100 nT",
            Self::Nt10 => "10 nT",
        }
    }

    /// Choice matching a stored extent size; unknown sizes map to `None`.
    #[must_use]
    pub fn from_extent_size(size: Option<f64>) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.extent_size() == size)
    }
}
