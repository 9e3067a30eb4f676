use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::api::{ChartConfig, ChartConfigOverrides, ScaleChoice, TimeseriesView};
use crate::core::SeriesKey;
use crate::error::ChartResult;
use crate::interaction::{PlotStateUpdate, SharedPlotState};
use crate::render::Renderer;
use crate::series::{SeriesEvent, SeriesFetcher, SeriesManager};

/// One [`TimeseriesView`] per managed series, in the manager's order.
///
/// On a collection reset, views of series that are still managed (same key
/// and instance) are kept, views of removed series are dropped, and new
/// views are created with a renderer from `make_renderer`. All views share
/// one plot state.
pub struct TimeseriesCollectionView<R, M>
where
    R: Renderer,
    M: FnMut() -> R,
{
    make_renderer: M,
    plot_state: SharedPlotState,
    overrides: ChartConfigOverrides,
    config: ChartConfig,
    views: IndexMap<SeriesKey, TimeseriesView<R>>,
}

impl<R, M> TimeseriesCollectionView<R, M>
where
    R: Renderer,
    M: FnMut() -> R,
{
    pub fn new(plot_state: SharedPlotState, host_width: u32, make_renderer: M) -> ChartResult<Self> {
        Self::with_overrides(
            plot_state,
            host_width,
            ChartConfigOverrides::default(),
            make_renderer,
        )
    }

    pub fn with_overrides(
        plot_state: SharedPlotState,
        host_width: u32,
        overrides: ChartConfigOverrides,
        make_renderer: M,
    ) -> ChartResult<Self> {
        let config = overrides.resolve(ChartConfig::collection_item(host_width))?;
        Ok(Self {
            make_renderer,
            plot_state,
            overrides,
            config,
            views: IndexMap::new(),
        })
    }

    #[must_use]
    pub fn plot_state(&self) -> &SharedPlotState {
        &self.plot_state
    }

    #[must_use]
    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.views.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.views.keys()
    }

    #[must_use]
    pub fn view(&self, key: &SeriesKey) -> Option<&TimeseriesView<R>> {
        self.views.get(key)
    }

    pub fn view_mut(&mut self, key: &SeriesKey) -> Option<&mut TimeseriesView<R>> {
        self.views.get_mut(key)
    }

    /// Drains the manager's notifications and applies them.
    ///
    /// Every drained event is applied even when an earlier one fails; the
    /// first failure is returned.
    pub fn handle_events<F: SeriesFetcher>(
        &mut self,
        manager: &mut SeriesManager<F>,
    ) -> ChartResult<()> {
        let mut first_error = None;
        for event in manager.drain_events() {
            let applied = match event {
                SeriesEvent::Reset { .. } => self.reconcile(manager),
                SeriesEvent::DataChanged { key } => {
                    match (self.views.get_mut(&key), manager.get(&key)) {
                        (Some(view), Some(series)) => view.render(series),
                        _ => Ok(()),
                    }
                }
            };
            if let Err(err) = applied {
                warn!(error = %err, "series event failed");
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Rebuilds the view list from the manager's current collection.
    pub fn reconcile<F: SeriesFetcher>(&mut self, manager: &SeriesManager<F>) -> ChartResult<()> {
        let mut previous = std::mem::take(&mut self.views);
        let mut kept = 0_usize;
        let mut created = 0_usize;
        let mut first_error = None;

        for series in manager.timeseries() {
            let Some(key) = series.key() else {
                continue;
            };
            let view = match previous.shift_remove(key) {
                Some(view) if view.instance() == series.instance() => {
                    kept += 1;
                    Ok(view)
                }
                _ => {
                    created += 1;
                    TimeseriesView::new(
                        (self.make_renderer)(),
                        self.config.clone(),
                        self.plot_state.clone(),
                        series,
                    )
                }
            };
            let mut view = match view {
                Ok(view) => view,
                Err(err) => {
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            if let Err(err) = view.render(series) {
                warn!(%key, error = %err, "view render failed");
                first_error.get_or_insert(err);
            }
            self.views.insert(key.clone(), view);
        }

        debug!(kept, created, dropped = previous.len(), "collection view reset");
        first_error.map_or(Ok(()), Err)
    }

    /// Applies pending shared-state changes to every view. Returns how many
    /// re-rendered.
    pub fn sync<F: SeriesFetcher>(&mut self, manager: &SeriesManager<F>) -> ChartResult<usize> {
        let mut rendered = 0;
        for (key, view) in &mut self.views {
            if let Some(series) = manager.get(key) {
                if view.sync(series)? {
                    rendered += 1;
                }
            }
        }
        Ok(rendered)
    }

    pub fn render_all<F: SeriesFetcher>(&mut self, manager: &SeriesManager<F>) -> ChartResult<()> {
        for (key, view) in &mut self.views {
            if let Some(series) = manager.get(key) {
                view.render(series)?;
            }
        }
        Ok(())
    }

    /// Publishes a y-scale preference to every chart.
    pub fn set_scale(&self, choice: ScaleChoice) -> ChartResult<()> {
        self.plot_state
            .update(PlotStateUpdate::y_extent_size(choice.extent_size()))?;
        Ok(())
    }

    #[must_use]
    pub fn scale(&self) -> Option<ScaleChoice> {
        ScaleChoice::from_extent_size(self.plot_state.get().y_extent_size)
    }

    /// Re-sizes every chart for a new host width.
    pub fn resize<F: SeriesFetcher>(
        &mut self,
        host_width: u32,
        manager: &SeriesManager<F>,
    ) -> ChartResult<()> {
        let config = self
            .overrides
            .resolve(ChartConfig::collection_item(host_width))?;
        if config == self.config {
            return Ok(());
        }
        for view in self.views.values_mut() {
            view.chart_mut().set_config(config.clone())?;
        }
        self.config = config;
        self.render_all(manager)
    }
}
