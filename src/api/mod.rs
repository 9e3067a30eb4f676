//! Chart engine, layout helpers and views.

mod chart;
mod chart_config;
mod collection_view;
mod gap_layout;
mod scale_choice;
mod series_path;
mod time_ticks;
mod timeseries_view;
mod tooltip;
mod y_axis;

pub use chart::{ChartLayout, Hover, TimeseriesChart};
pub use chart_config::{
    COMPACT_HOST_WIDTH, ChartConfig, ChartConfigOverrides, collection_view_size,
};
pub use collection_view::TimeseriesCollectionView;
pub use gap_layout::{GapBounds, GapLayout};
pub use scale_choice::ScaleChoice;
pub use series_path::series_polylines;
pub use time_ticks::{TimeInterval, TimeTick, format_time_tick, time_ticks};
pub use timeseries_view::{LOAD_ERROR_MESSAGE, TimeseriesView, ViewHeader};
pub use tooltip::{TooltipContent, place_tooltip};
pub use y_axis::YAxisLabels;
