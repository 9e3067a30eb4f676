//! geomag-chart: geomagnetic time-series reconciliation and synchronized
//! chart rendering.
//!
//! [`series::SeriesManager`] keeps one [`core::Timeseries`] per selected
//! element and observatory, fetching data through a host-provided
//! [`series::SeriesFetcher`]. [`api::TimeseriesChart`] draws a series into a
//! backend-agnostic [`render::RenderFrame`], and charts sharing one
//! [`interaction::SharedPlotState`] stay in step on zoom, pan and hover.

pub mod api;
pub mod core;
pub mod error;
pub mod interaction;
pub mod render;
pub mod series;
pub mod telemetry;

pub use api::{
    ChartConfig, ChartConfigOverrides, TimeseriesChart, TimeseriesCollectionView, TimeseriesView,
};
pub use error::{ChartError, ChartResult};
pub use series::{SeriesFetcher, SeriesManager};
