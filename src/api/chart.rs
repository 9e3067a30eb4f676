use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::api::{
    ChartConfig, GapLayout, TooltipContent, YAxisLabels, place_tooltip, series_polylines,
    time_ticks,
};
use crate::core::{
    Gap, LinearScale, PlotFrame, Timeseries, bisect_left, datetime_to_unix_millis, nearest_index,
    padded_window, padded_y_domain, windowed_y_extent, x_extent,
};
use crate::error::ChartResult;
use crate::interaction::{
    InteractionMode, InteractionState, PlotStateUpdate, SharedPlotState, SubscriptionId,
};
use crate::render::{
    CirclePrimitive, Color, LinePrimitive, PolylinePrimitive, RectPrimitive, RenderFrame,
    Renderer, TextHAlign, TextPrimitive,
};

const FRAME_FILL: Color = Color::rgb(1.0, 1.0, 1.0);
const FRAME_BORDER: Color = Color::rgb(0.8, 0.8, 0.8);
const AXIS_COLOR: Color = Color::rgb(0.2, 0.2, 0.2);
const LINE_COLOR: Color = Color::rgb(0.0, 0.0, 0.0);
const GAP_FILL: Color = Color::rgb(0.9, 0.9, 0.9).with_alpha(0.8);
const POINT_COLOR: Color = Color::rgb(0.8, 0.1, 0.1);
const TOOLTIP_FILL: Color = FRAME_FILL.with_alpha(0.9);
const TOOLTIP_BORDER: Color = Color::rgb(0.6, 0.6, 0.6);
const TEXT_COLOR: Color = Color::rgb(0.1, 0.1, 0.1);
const LINE_WIDTH: f64 = 1.0;
const TICK_SIZE: f64 = 6.0;
const TICK_LABEL_GAP: f64 = 3.0;
/// Half-width, in milliseconds, given to a time axis whose data spans one
/// instant.
const SINGLE_SAMPLE_HALF_SPAN_MS: f64 = 500.0;

/// Sample or gap under the shared hovered timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hover {
    Sample {
        index: usize,
        time: DateTime<Utc>,
        value: f64,
    },
    Gap {
        index: usize,
        time: DateTime<Utc>,
        gap: Gap,
    },
}

/// Scales and cached geometry from the last layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    /// X scale over the full data extent.
    pub base_x: LinearScale,
    /// X scale after the shared zoom transform.
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    /// Unpadded y extent for the visible window.
    pub y_extent: (f64, f64),
    pub gaps: GapLayout,
}

/// Engine for one timeseries chart bound to a shared plot state.
///
/// The chart does not own its series; callers pass the current
/// [`Timeseries`] to every operation that needs data. Interaction methods
/// write to the shared state and then apply the resulting change to this
/// chart; other charts pick it up from their own `sync`.
pub struct TimeseriesChart<R: Renderer> {
    renderer: R,
    config: ChartConfig,
    frame: PlotFrame,
    plot_state: SharedPlotState,
    subscription: SubscriptionId,
    interaction: InteractionState,
    layout: Option<ChartLayout>,
}

impl<R: Renderer> TimeseriesChart<R> {
    pub fn new(renderer: R, config: ChartConfig, plot_state: SharedPlotState) -> ChartResult<Self> {
        let config = config.validate()?;
        let frame = config.plot_frame()?;
        let subscription = plot_state.subscribe();
        trace!(%subscription, width = config.width, height = config.height, "chart created");
        Ok(Self {
            renderer,
            config,
            frame,
            plot_state,
            subscription,
            interaction: InteractionState::default(),
            layout: None,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ChartConfig) -> ChartResult<()> {
        let config = config.validate()?;
        self.frame = config.plot_frame()?;
        self.config = config;
        self.layout = None;
        Ok(())
    }

    #[must_use]
    pub fn plot_frame(&self) -> PlotFrame {
        self.frame
    }

    #[must_use]
    pub fn plot_state(&self) -> &SharedPlotState {
        &self.plot_state
    }

    #[must_use]
    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn interaction_mode(&self) -> InteractionMode {
        self.interaction.mode()
    }

    #[must_use]
    pub fn layout(&self) -> Option<&ChartLayout> {
        self.layout.as_ref()
    }

    /// Visible x domain in Unix milliseconds.
    #[must_use]
    pub fn x_extent(&self) -> Option<(f64, f64)> {
        self.layout.as_ref().map(|layout| layout.x_scale.domain())
    }

    #[must_use]
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        self.layout.as_ref().map(|layout| layout.y_extent)
    }

    /// Recomputes scales and gap geometry from the series and shared state.
    pub fn update_layout(&mut self, series: &Timeseries) -> ChartResult<()> {
        let Some(full_extent) = x_extent(series.times()) else {
            self.layout = None;
            return Ok(());
        };
        let full_extent = if full_extent.0 == full_extent.1 {
            (
                full_extent.0 - SINGLE_SAMPLE_HALF_SPAN_MS,
                full_extent.1 + SINGLE_SAMPLE_HALF_SPAN_MS,
            )
        } else {
            full_extent
        };

        let state = self.plot_state.get();
        let base_x = LinearScale::new(full_extent, (0.0, self.frame.width))?;
        let x_scale = if state.zoom.is_identity() {
            base_x
        } else {
            state.zoom.rescale(base_x)?
        };

        let y_extent = windowed_y_extent(
            series.times(),
            series.values(),
            Some(x_scale.domain()),
            state.y_extent_size,
        );
        let y_domain = padded_y_domain(y_extent, self.config.y_domain_padding);
        let y_scale = LinearScale::new(y_domain, (self.frame.height, 0.0))?;
        let gaps = GapLayout::compute(series.times(), &series.get_gaps(), x_scale, y_scale)?;

        self.layout = Some(ChartLayout {
            base_x,
            x_scale,
            y_scale,
            y_extent,
            gaps,
        });
        Ok(())
    }

    /// Resolves the shared hovered timestamp against this chart's series.
    ///
    /// A timestamp on a missing sample resolves to the gap containing it;
    /// a timestamp past the data, or one this series cannot place, hides the
    /// tooltip on this chart only.
    #[must_use]
    pub fn hover(&self, series: &Timeseries) -> Option<Hover> {
        let tooltip_x = self.plot_state.get().tooltip_x?;
        let times = series.times();
        let index = bisect_left(times, datetime_to_unix_millis(tooltip_x), 0);
        let time = *times.get(index)?;
        match series.values().get(index).copied().flatten() {
            Some(value) => Some(Hover::Sample { index, time, value }),
            None => {
                let layout = self.layout.as_ref()?;
                let bounds = layout.gaps.gap_for_index(index)?;
                Some(Hover::Gap {
                    index,
                    time,
                    gap: bounds.gap,
                })
            }
        }
    }

    pub fn build_render_frame(&mut self, series: &Timeseries) -> ChartResult<RenderFrame> {
        self.update_layout(series)?;

        let mut frame = RenderFrame::new(self.config.viewport());
        let (origin_x, origin_y) = (self.frame.origin_x, self.frame.origin_y);
        let (width, height) = (self.frame.width, self.frame.height);

        frame.rects.push(
            RectPrimitive::new(origin_x, origin_y, width, height, FRAME_FILL)
                .with_border(1.0, FRAME_BORDER),
        );
        self.push_title(&mut frame);

        let Some(layout) = self.layout.clone() else {
            return Ok(frame);
        };

        frame
            .rects
            .extend(layout.gaps.rects((origin_x, origin_y), width, GAP_FILL));

        let window = padded_window(series.times(), layout.x_scale.domain());
        for run in series_polylines(
            series.times(),
            series.values(),
            window,
            layout.x_scale,
            layout.y_scale,
            (width, height),
        )? {
            let points = run
                .into_iter()
                .map(|(x, y)| self.frame.to_absolute(x, y))
                .collect();
            frame
                .polylines
                .push(PolylinePrimitive::new(points, LINE_WIDTH, LINE_COLOR));
        }

        self.push_x_axis(&mut frame, &layout)?;
        self.push_y_axis(&mut frame, &layout, series.units())?;
        if let Some(hover) = self.hover(series) {
            self.push_hover(&mut frame, &layout, hover, series.units())?;
        }

        Ok(frame)
    }

    pub fn render(&mut self, series: &Timeseries) -> ChartResult<()> {
        let frame = self.build_render_frame(series)?;
        debug!(
            subscription = %self.subscription,
            polylines = frame.polylines.len(),
            rects = frame.rects.len(),
            texts = frame.texts.len(),
            "render chart"
        );
        self.renderer.render(&frame)
    }

    /// Applies pending shared-state changes. Returns `true` when the chart
    /// re-rendered.
    pub fn sync(&mut self, series: &Timeseries) -> ChartResult<bool> {
        let changes = self.plot_state.take_changes(self.subscription);
        if changes.is_empty() {
            return Ok(false);
        }
        trace!(subscription = %self.subscription, ?changes, "sync chart");
        self.render(series)?;
        Ok(true)
    }

    /// Pointer position in viewport pixels.
    pub fn pointer_move(&mut self, series: &Timeseries, x: f64, y: f64) -> ChartResult<bool> {
        let local_x = x - self.frame.origin_x;
        let local_y = y - self.frame.origin_y;
        if !(0.0..=self.frame.width).contains(&local_x)
            || !(0.0..=self.frame.height).contains(&local_y)
        {
            return self.pointer_out(series);
        }
        self.interaction.on_pointer_move(local_x, local_y);

        if self.layout.is_none() {
            self.update_layout(series)?;
        }
        let Some(layout) = self.layout.as_ref() else {
            return self.pointer_out(series);
        };
        let target = layout.x_scale.invert(local_x)?;
        let Some(index) = nearest_index(series.times(), target) else {
            return self.pointer_out(series);
        };
        self.plot_state
            .update(PlotStateUpdate::tooltip_x(Some(series.times()[index])))?;
        self.sync(series)
    }

    pub fn pointer_out(&mut self, series: &Timeseries) -> ChartResult<bool> {
        self.interaction.on_pointer_leave();
        self.plot_state.update(PlotStateUpdate::tooltip_x(None))?;
        self.sync(series)
    }

    /// Zooms about viewport pixel `x`; positive `delta` zooms out.
    pub fn wheel(&mut self, series: &Timeseries, x: f64, delta: f64) -> ChartResult<bool> {
        let anchor = (x - self.frame.origin_x).clamp(0.0, self.frame.width);
        let current = self.plot_state.get().zoom;
        let zoom = self.config.zoom.wheel(current, anchor, delta, self.frame.width);
        self.plot_state.update(PlotStateUpdate::zoom(zoom))?;
        self.sync(series)
    }

    pub fn pan_start(&mut self, x: f64) {
        self.interaction.on_pan_start(x);
    }

    pub fn pan_move(&mut self, series: &Timeseries, x: f64) -> ChartResult<bool> {
        let Some(dx) = self.interaction.on_pan_move(x) else {
            return Ok(false);
        };
        let current = self.plot_state.get().zoom;
        let zoom = self.config.zoom.drag(current, dx, self.frame.width);
        self.plot_state.update(PlotStateUpdate::zoom(zoom))?;
        self.sync(series)
    }

    pub fn pan_end(&mut self) {
        self.interaction.on_pan_end();
    }

    fn push_title(&self, frame: &mut RenderFrame) {
        if self.config.title.is_empty() {
            return;
        }
        let margin = self.config.margin;
        let outer_width = f64::from(self.config.width) - margin.horizontal();
        let y = (margin.top + self.config.padding.top - 1.5 * self.config.axis_font_size_px)
            .max(margin.top);
        frame.texts.push(TextPrimitive::new(
            self.config.title.clone(),
            margin.left + outer_width / 2.0,
            y,
            self.config.axis_font_size_px,
            TEXT_COLOR,
            TextHAlign::Center,
        ));
    }

    fn push_x_axis(&self, frame: &mut RenderFrame, layout: &ChartLayout) -> ChartResult<()> {
        let font = self.config.axis_font_size_px;
        let (width, height) = (self.frame.width, self.frame.height);
        let (left, bottom) = self.frame.to_absolute(0.0, height);
        let (right, _) = self.frame.to_absolute(width, height);
        frame
            .lines
            .push(LinePrimitive::new(left, bottom, right, bottom, 1.0, AXIS_COLOR));

        for tick in time_ticks(layout.x_scale.domain(), self.config.x_tick_count) {
            let x = layout.x_scale.map(datetime_to_unix_millis(tick.time))?;
            if !(0.0..=width).contains(&x) {
                continue;
            }
            let (tick_x, tick_y) = self.frame.to_absolute(x, height);
            frame.lines.push(LinePrimitive::new(
                tick_x,
                tick_y,
                tick_x,
                tick_y + TICK_SIZE,
                1.0,
                AXIS_COLOR,
            ));
            frame.texts.push(TextPrimitive::new(
                tick.label,
                tick_x,
                tick_y + TICK_SIZE + TICK_LABEL_GAP,
                font,
                TEXT_COLOR,
                TextHAlign::Center,
            ));
        }

        if !self.config.x_axis_label.is_empty() {
            let label_y = height + self.config.padding.bottom - 1.5 * font;
            let (x, y) = self.frame.to_absolute(width / 2.0, label_y.max(height));
            frame.texts.push(TextPrimitive::new(
                self.config.x_axis_label.clone(),
                x,
                y,
                font,
                TEXT_COLOR,
                TextHAlign::Center,
            ));
        }
        Ok(())
    }

    fn push_y_axis(
        &self,
        frame: &mut RenderFrame,
        layout: &ChartLayout,
        units: &str,
    ) -> ChartResult<()> {
        let font = self.config.axis_font_size_px;
        let (top_x, top_y) = self.frame.to_absolute(0.0, 0.0);
        let (_, bottom_y) = self.frame.to_absolute(0.0, self.frame.height);
        frame
            .lines
            .push(LinePrimitive::new(top_x, top_y, top_x, bottom_y, 1.0, AXIS_COLOR));

        for (value, label) in YAxisLabels::new(layout.y_extent, units).labelled_ticks() {
            let y = layout.y_scale.map(value)?;
            let (tick_x, tick_y) = self.frame.to_absolute(0.0, y);
            frame.lines.push(LinePrimitive::new(
                tick_x - TICK_SIZE,
                tick_y,
                tick_x,
                tick_y,
                1.0,
                AXIS_COLOR,
            ));
            frame.texts.push(TextPrimitive::new(
                label,
                tick_x - TICK_SIZE - TICK_LABEL_GAP,
                tick_y - font / 2.0,
                font,
                TEXT_COLOR,
                TextHAlign::Right,
            ));
        }

        if !self.config.y_axis_label.is_empty() {
            let (x, y) = self
                .frame
                .to_absolute(-self.config.padding.left, self.frame.height / 2.0);
            frame.texts.push(TextPrimitive::new(
                self.config.y_axis_label.clone(),
                x.max(0.0),
                y,
                font,
                TEXT_COLOR,
                TextHAlign::Left,
            ));
        }
        Ok(())
    }

    fn push_hover(
        &self,
        frame: &mut RenderFrame,
        layout: &ChartLayout,
        hover: Hover,
        units: &str,
    ) -> ChartResult<()> {
        let (time, value, content) = match hover {
            Hover::Sample { time, value, .. } => {
                (time, value, TooltipContent::for_value(time, value, units))
            }
            Hover::Gap { time, gap, .. } => {
                let (low, high) = layout.y_scale.domain();
                (time, low / 2.0 + high / 2.0, TooltipContent::for_gap(&gap))
            }
        };

        let x = layout.x_scale.map(datetime_to_unix_millis(time))?;
        let y = layout.y_scale.map(value)?;
        if x > 0.0 {
            let (cx, cy) = self.frame.to_absolute(x, y);
            frame.circles.push(CirclePrimitive::new(
                cx,
                cy,
                self.config.point_radius,
                POINT_COLOR,
            ));
        }

        let font = self.config.tooltip_font_size_px;
        let padding = self.config.tooltip_padding;
        let size = content.estimated_size(font, padding);
        let Some((tooltip_x, tooltip_y)) = place_tooltip(
            (x, y),
            size,
            (self.frame.width, self.frame.height),
            self.config.tooltip_offset,
        ) else {
            trace!(subscription = %self.subscription, "tooltip suppressed");
            return Ok(());
        };

        let (box_x, box_y) = self.frame.to_absolute(tooltip_x, tooltip_y);
        frame.overlay_rects.push(
            RectPrimitive::new(box_x, box_y, size.0, size.1, TOOLTIP_FILL)
                .with_border(1.0, TOOLTIP_BORDER),
        );
        let line_height = (size.1 - 2.0 * padding) / content.lines().len() as f64;
        for (row, line) in content.lines().into_iter().enumerate() {
            frame.texts.push(TextPrimitive::new(
                line,
                box_x + padding,
                box_y + padding + row as f64 * line_height,
                font,
                TEXT_COLOR,
                TextHAlign::Left,
            ));
        }
        Ok(())
    }
}

impl<R: Renderer> Drop for TimeseriesChart<R> {
    fn drop(&mut self) {
        self.plot_state.unsubscribe(self.subscription);
    }
}
