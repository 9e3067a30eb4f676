pub mod catalog;
pub mod extent;
pub mod ordering;
pub mod primitives;
pub mod scale;
pub mod timeseries;
pub mod types;
pub mod windowing;

pub use catalog::{Catalog, DEFAULT_UNITS, Element, Observatory, parse_observatories_geojson};
pub use extent::{
    DEFAULT_Y_EXTENT, finite_extent, finite_mean, padded_y_domain, windowed_y_extent, x_extent,
};
pub use ordering::{compare_series_keys, sort_series_keys};
pub use primitives::{
    datetime_to_unix_millis, format_fixed, format_iso_time_of_day, format_iso8601,
    unix_millis_to_datetime,
};
pub use scale::LinearScale;
pub use timeseries::{Gap, SeriesId, SeriesKey, Timeseries};
pub use types::{Insets, PlotFrame, Viewport};
pub use windowing::{bisect_left, nearest_index, padded_window};
