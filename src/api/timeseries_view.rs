use tracing::debug;

use crate::api::{ChartConfig, TimeseriesChart};
use crate::core::Timeseries;
use crate::error::ChartResult;
use crate::interaction::SharedPlotState;
use crate::render::{Color, RenderFrame, Renderer, TextHAlign, TextPrimitive};

/// Message shown in place of the chart when a series failed to load.
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load timeseries data.";

const ERROR_TEXT_COLOR: Color = Color::rgb(0.6, 0.1, 0.1);

/// Labels shown above a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewHeader {
    pub observatory: String,
    pub channel: String,
}

impl ViewHeader {
    /// Observatory id and the element's abbreviation, falling back to ids
    /// from the series key when descriptors are missing.
    #[must_use]
    pub fn for_series(series: &Timeseries) -> Self {
        let key = series.key();
        let observatory = series
            .observatory()
            .map(|observatory| observatory.id.clone())
            .or_else(|| key.map(|key| key.observatory.clone()))
            .unwrap_or_default();
        let channel = series
            .element()
            .map(|element| element.display_label().to_owned())
            .or_else(|| key.map(|key| key.element.clone()))
            .unwrap_or_default();
        Self {
            observatory,
            channel,
        }
    }
}

/// One series' header plus either its chart or a load error.
pub struct TimeseriesView<R: Renderer> {
    instance: u64,
    header: ViewHeader,
    chart: TimeseriesChart<R>,
    showing_error: bool,
}

impl<R: Renderer> TimeseriesView<R> {
    pub fn new(
        renderer: R,
        config: ChartConfig,
        plot_state: SharedPlotState,
        series: &Timeseries,
    ) -> ChartResult<Self> {
        Ok(Self {
            instance: series.instance(),
            header: ViewHeader::for_series(series),
            chart: TimeseriesChart::new(renderer, config, plot_state)?,
            showing_error: false,
        })
    }

    /// Instance handle of the series this view was created for.
    #[must_use]
    pub fn instance(&self) -> u64 {
        self.instance
    }

    #[must_use]
    pub fn header(&self) -> &ViewHeader {
        &self.header
    }

    #[must_use]
    pub fn chart(&self) -> &TimeseriesChart<R> {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut TimeseriesChart<R> {
        &mut self.chart
    }

    #[must_use]
    pub fn is_showing_error(&self) -> bool {
        self.showing_error
    }

    pub fn render(&mut self, series: &Timeseries) -> ChartResult<()> {
        self.header = ViewHeader::for_series(series);
        self.showing_error = series.has_error();
        if !self.showing_error {
            return self.chart.render(series);
        }

        debug!(
            observatory = %self.header.observatory,
            channel = %self.header.channel,
            error = series.error().unwrap_or_default(),
            "render load error"
        );
        let config = self.chart.config();
        let frame = RenderFrame::new(config.viewport()).with_text(TextPrimitive::new(
            LOAD_ERROR_MESSAGE,
            f64::from(config.width) / 2.0,
            f64::from(config.height) / 2.0,
            config.axis_font_size_px,
            ERROR_TEXT_COLOR,
            TextHAlign::Center,
        ));
        self.chart.renderer_mut().render(&frame)
    }

    /// Applies pending shared-state changes to the chart. A view showing a
    /// load error discards them.
    pub fn sync(&mut self, series: &Timeseries) -> ChartResult<bool> {
        if self.showing_error {
            let plot_state = self.chart.plot_state();
            plot_state.take_changes(self.chart.subscription());
            return Ok(false);
        }
        self.chart.sync(series)
    }
}
