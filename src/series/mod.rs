//! Selection reconciliation and data fetching.

pub mod config;
pub mod fetch;
pub mod manager;
pub mod request;
pub mod time_mode;

pub use config::{ConfigChanges, ConfigUpdate, SeriesConfig};
pub use fetch::{
    ChannelValues, DEFAULT_FETCH_ERROR, FetchDescriptor, FetchFailure, FetchOutcome,
    FetchResponse, FetchTicket, SeriesFetcher,
};
pub use manager::{SeriesEvent, SeriesManager, SeriesManagerOptions};
pub use request::{RequestState, RequestWindow, SeriesRequest};
pub use time_mode::{AutoUpdater, ResolvedWindow, TimeMode, round_up_to_minutes};
