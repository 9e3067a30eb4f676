use serde::{Deserialize, Serialize};

use crate::core::{Insets, PlotFrame, Viewport};
use crate::error::{ChartError, ChartResult};
use crate::interaction::ZoomBehavior;

/// Host width below which collection views switch to the compact size.
pub const COMPACT_HOST_WIDTH: u32 = 768;

/// Layout and presentation options for one chart.
///
/// Every field has a default, so partial JSON documents deserialize into a
/// complete config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin: Insets,
    pub padding: Insets,
    pub point_radius: f64,
    pub tooltip_offset: f64,
    pub tooltip_padding: f64,
    pub tooltip_font_size_px: f64,
    pub axis_font_size_px: f64,
    /// Fraction of the y extent added above and below it.
    pub y_domain_padding: f64,
    pub zoom: ZoomBehavior,
    pub x_tick_count: usize,
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 500,
            margin: Insets::default(),
            padding: Insets::new(50.0, 5.0, 75.0, 100.0),
            point_radius: 3.0,
            tooltip_offset: 10.0,
            tooltip_padding: 5.0,
            tooltip_font_size_px: 12.0,
            axis_font_size_px: 11.0,
            y_domain_padding: 0.1,
            zoom: ZoomBehavior::default(),
            x_tick_count: 5,
            title: String::new(),
            x_axis_label: String::new(),
            y_axis_label: String::new(),
        }
    }
}

impl ChartConfig {
    /// Preset used for each chart of a timeseries view.
    #[must_use]
    pub fn timeseries_view() -> Self {
        Self {
            height: 240,
            padding: Insets::new(1.0, 1.0, 25.0, 90.0),
            ..Self::default()
        }
    }

    /// Timeseries view preset sized for a collection hosted in `host_width`
    /// pixels.
    #[must_use]
    pub fn collection_item(host_width: u32) -> Self {
        let (width, height) = collection_view_size(host_width);
        Self {
            width,
            height,
            ..Self::timeseries_view()
        }
    }

    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    #[must_use]
    pub fn with_overrides(self, overrides: &ChartConfigOverrides) -> Self {
        overrides.apply_to(self)
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    pub fn plot_frame(&self) -> ChartResult<PlotFrame> {
        PlotFrame::resolve(self.viewport(), self.margin, self.padding)
    }

    pub fn validate(self) -> ChartResult<Self> {
        if !self.viewport().is_valid() {
            return Err(ChartError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        self.margin.validate()?;
        self.padding.validate()?;
        self.plot_frame()?;
        self.zoom.validate()?;

        for (name, value) in [
            ("point_radius", self.point_radius),
            ("tooltip_font_size_px", self.tooltip_font_size_px),
            ("axis_font_size_px", self.axis_font_size_px),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "`{name}` must be finite and > 0"
                )));
            }
        }
        for (name, value) in [
            ("tooltip_offset", self.tooltip_offset),
            ("tooltip_padding", self.tooltip_padding),
            ("y_domain_padding", self.y_domain_padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!(
                    "`{name}` must be finite and >= 0"
                )));
            }
        }
        if self.x_tick_count == 0 {
            return Err(ChartError::InvalidConfig(
                "`x_tick_count` must be > 0".to_owned(),
            ));
        }
        Ok(self)
    }
}

/// Caller-provided options layered over a preset.
///
/// Resolution order is caller value, then preset value, then
/// `ChartConfig::default()` (which the presets start from).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub margin: Option<Insets>,
    pub padding: Option<Insets>,
    pub point_radius: Option<f64>,
    pub tooltip_offset: Option<f64>,
    pub tooltip_padding: Option<f64>,
    pub tooltip_font_size_px: Option<f64>,
    pub axis_font_size_px: Option<f64>,
    pub y_domain_padding: Option<f64>,
    pub zoom: Option<ZoomBehavior>,
    pub x_tick_count: Option<usize>,
    pub title: Option<String>,
    pub x_axis_label: Option<String>,
    pub y_axis_label: Option<String>,
}

impl ChartConfigOverrides {
    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies the set fields over `preset`, then validates the result.
    pub fn resolve(&self, preset: ChartConfig) -> ChartResult<ChartConfig> {
        self.apply_to(preset).validate()
    }

    fn apply_to(&self, preset: ChartConfig) -> ChartConfig {
        ChartConfig {
            width: self.width.unwrap_or(preset.width),
            height: self.height.unwrap_or(preset.height),
            margin: self.margin.unwrap_or(preset.margin),
            padding: self.padding.unwrap_or(preset.padding),
            point_radius: self.point_radius.unwrap_or(preset.point_radius),
            tooltip_offset: self.tooltip_offset.unwrap_or(preset.tooltip_offset),
            tooltip_padding: self.tooltip_padding.unwrap_or(preset.tooltip_padding),
            tooltip_font_size_px: self
                .tooltip_font_size_px
                .unwrap_or(preset.tooltip_font_size_px),
            axis_font_size_px: self.axis_font_size_px.unwrap_or(preset.axis_font_size_px),
            y_domain_padding: self.y_domain_padding.unwrap_or(preset.y_domain_padding),
            zoom: self.zoom.unwrap_or(preset.zoom),
            x_tick_count: self.x_tick_count.unwrap_or(preset.x_tick_count),
            title: self.title.clone().unwrap_or(preset.title),
            x_axis_label: self.x_axis_label.clone().unwrap_or(preset.x_axis_label),
            y_axis_label: self.y_axis_label.clone().unwrap_or(preset.y_axis_label),
        }
    }
}

/// `(width, height)` of each chart in a collection view.
#[must_use]
pub fn collection_view_size(host_width: u32) -> (u32, u32) {
    if host_width < COMPACT_HOST_WIDTH {
        (480, 200)
    } else {
        (960, 150)
    }
}
