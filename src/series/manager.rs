use chrono::{DateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::{Catalog, SeriesId, SeriesKey, Timeseries, compare_series_keys};
use crate::error::{ChartError, ChartResult};
use crate::series::config::{ConfigChanges, ConfigUpdate, SeriesConfig};
use crate::series::fetch::{FetchOutcome, FetchTicket, SeriesFetcher};
use crate::series::request::{RequestWindow, SeriesRequest};

/// Request tuning for the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesManagerOptions {
    /// Windows no longer than this are fetched at seconds resolution.
    pub seconds_window_limit_secs: i64,
    pub seconds_sampling_period: u32,
    pub minutes_sampling_period: u32,
    /// Forwarded as the descriptor's data `type`.
    #[serde(default)]
    pub data_type: Option<String>,
}

impl Default for SeriesManagerOptions {
    fn default() -> Self {
        Self {
            seconds_window_limit_secs: 30 * 60,
            seconds_sampling_period: 1,
            minutes_sampling_period: 60,
            data_type: None,
        }
    }
}

impl SeriesManagerOptions {
    pub fn validate(self) -> ChartResult<Self> {
        if self.seconds_window_limit_secs < 0 {
            return Err(ChartError::InvalidConfig(
                "seconds window limit must be >= 0".to_owned(),
            ));
        }
        if self.seconds_sampling_period == 0 || self.minutes_sampling_period == 0 {
            return Err(ChartError::InvalidConfig(
                "sampling periods must be > 0".to_owned(),
            ));
        }
        Ok(self)
    }

    /// Sampling period in seconds for a window.
    #[must_use]
    pub fn sampling_period(&self, starttime: DateTime<Utc>, endtime: DateTime<Utc>) -> u32 {
        if endtime - starttime <= TimeDelta::seconds(self.seconds_window_limit_secs) {
            self.seconds_sampling_period
        } else {
            self.minutes_sampling_period
        }
    }
}

/// Notification emitted by the manager, drained by views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesEvent {
    /// The managed collection was replaced by this ordered key set. Entities
    /// whose key appears before and after are the same instances.
    Reset { keys: Vec<SeriesKey> },
    /// A series' data, metadata or error changed.
    DataChanged { key: SeriesKey },
}

/// Owns the managed Timeseries and keeps them in step with the configuration.
///
/// Configuration changes are reconciled synchronously: the collection is
/// rebuilt from the selection (reusing existing entities), every pending
/// request is aborted and one new request per series is issued. Outcomes are
/// delivered through [`SeriesManager::complete`]; only the request currently
/// pending under a ticket may touch its series.
pub struct SeriesManager<F: SeriesFetcher> {
    fetcher: F,
    catalog: Catalog,
    options: SeriesManagerOptions,
    config: SeriesConfig,
    timeseries: IndexMap<SeriesKey, Timeseries>,
    pending: IndexMap<FetchTicket, SeriesRequest>,
    next_ticket: u64,
    events: Vec<SeriesEvent>,
}

impl<F: SeriesFetcher> SeriesManager<F> {
    #[must_use]
    pub fn new(fetcher: F, catalog: Catalog) -> Self {
        Self {
            fetcher,
            catalog,
            options: SeriesManagerOptions::default(),
            config: SeriesConfig::default(),
            timeseries: IndexMap::new(),
            pending: IndexMap::new(),
            next_ticket: 1,
            events: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: SeriesManagerOptions) -> ChartResult<Self> {
        self.options = options.validate()?;
        Ok(self)
    }

    #[must_use]
    pub fn config(&self) -> &SeriesConfig {
        &self.config
    }

    #[must_use]
    pub fn options(&self) -> &SeriesManagerOptions {
        &self.options
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn fetcher_mut(&mut self) -> &mut F {
        &mut self.fetcher
    }

    /// Applies a partial configuration change and reconciles it.
    pub fn update_config(&mut self, update: ConfigUpdate) -> ConfigChanges {
        let changes = self.config.apply(update);
        if changes.is_empty() {
            trace!("configuration update changed nothing");
        } else {
            self.on_config_change(changes);
        }
        changes
    }

    /// Replaces the whole configuration and reconciles whatever differs.
    pub fn set_config(&mut self, config: SeriesConfig) -> ConfigChanges {
        self.update_config(config.into())
    }

    /// Reconciles a change: membership changes rebuild the collection and
    /// refetch; window-only changes refetch the existing collection.
    pub fn on_config_change(&mut self, changes: ConfigChanges) {
        if changes.membership {
            self.create_timeseries();
            self.fetch_data();
        } else if changes.window {
            self.fetch_data();
        }
    }

    /// Rebuilds and refetches everything from the current configuration.
    pub fn refresh(&mut self) {
        self.on_config_change(ConfigChanges::all());
    }

    /// Replaces reference descriptors and re-sorts the managed collection.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
        for (key, series) in &mut self.timeseries {
            series.set_descriptors(
                self.catalog.element(&key.element).cloned(),
                self.catalog.observatory(&key.observatory).cloned(),
            );
        }
        self.timeseries.sort_by(|a, _, b, _| {
            compare_series_keys(a, b, &self.catalog, &self.config.elements)
        });
        self.emit_reset();
    }

    /// Rebuilds the managed collection from the selection.
    ///
    /// Existing entities are moved into the new collection unchanged; only
    /// keys new to the selection get fresh entities. Emits a single reset.
    pub fn create_timeseries(&mut self) {
        let mut keys = self.config.desired_keys();
        keys.sort_by(|a, b| compare_series_keys(a, b, &self.catalog, &self.config.elements));

        let mut previous = std::mem::take(&mut self.timeseries);
        let mut next = IndexMap::with_capacity(keys.len());
        let mut created = 0usize;
        for key in keys {
            let series = match previous.shift_remove(&key) {
                Some(series) => series,
                None => {
                    created += 1;
                    Timeseries::new(SeriesId::Pair(key.clone())).with_descriptors(
                        self.catalog.element(&key.element).cloned(),
                        self.catalog.observatory(&key.observatory).cloned(),
                    )
                }
            };
            next.insert(key, series);
        }

        debug!(
            kept = next.len() - created,
            created,
            dropped = previous.len(),
            "reconciled series collection"
        );
        self.timeseries = next;
        self.emit_reset();
    }

    /// Aborts pending requests and issues one request per managed series.
    ///
    /// A missing or inverted window issues nothing and leaves every series
    /// empty.
    pub fn fetch_data(&mut self) {
        self.abort_requests();

        let Some((starttime, endtime)) = self.config.window() else {
            warn!(
                starttime = ?self.config.starttime,
                endtime = ?self.config.endtime,
                "time window is missing or inverted, not fetching"
            );
            for (key, series) in &mut self.timeseries {
                if !series.is_empty() || series.has_error() {
                    series.clear();
                    self.events.push(SeriesEvent::DataChanged { key: key.clone() });
                }
            }
            return;
        };

        let window = RequestWindow {
            starttime,
            endtime,
            sampling_period: self.options.sampling_period(starttime, endtime),
            data_type: self.options.data_type.clone(),
        };
        let keys: Vec<SeriesKey> = self.timeseries.keys().cloned().collect();
        for key in keys {
            let ticket = FetchTicket(self.next_ticket);
            self.next_ticket += 1;
            let mut request = SeriesRequest::new(ticket, key, window.clone());
            request.start(&mut self.fetcher);
            self.pending.insert(ticket, request);
        }
        debug!(
            requests = self.pending.len(),
            sampling_period = window.sampling_period,
            "fetching series data"
        );
    }

    /// Aborts every pending request.
    pub fn abort_requests(&mut self) {
        for request in self.pending.values_mut() {
            request.abort(&mut self.fetcher);
        }
        self.pending.clear();
    }

    /// Delivers a fetch outcome.
    ///
    /// Returns the key of the series that was updated, or `None` when the
    /// ticket is not pending (aborted, superseded or already completed) and
    /// the outcome was discarded.
    pub fn complete(&mut self, ticket: FetchTicket, outcome: FetchOutcome) -> Option<SeriesKey> {
        let Some(mut request) = self.pending.shift_remove(&ticket) else {
            trace!(%ticket, "discarding outcome for superseded request");
            return None;
        };
        let key = request.key().clone();
        let series = self.timeseries.get_mut(&key)?;
        if !request.complete(series, outcome) {
            return None;
        }
        self.events.push(SeriesEvent::DataChanged { key: key.clone() });
        Some(key)
    }

    #[must_use]
    pub fn get(&self, key: &SeriesKey) -> Option<&Timeseries> {
        self.timeseries.get(key)
    }

    /// Managed series in display order.
    pub fn timeseries(&self) -> impl Iterator<Item = &Timeseries> {
        self.timeseries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.timeseries.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timeseries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timeseries.is_empty()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Tickets currently in flight, oldest first.
    pub fn pending_tickets(&self) -> impl Iterator<Item = FetchTicket> + '_ {
        self.pending.keys().copied()
    }

    #[must_use]
    pub fn pending_ticket_for(&self, key: &SeriesKey) -> Option<FetchTicket> {
        self.pending
            .values()
            .find(|request| request.key() == key)
            .map(SeriesRequest::ticket)
    }

    /// Takes the notifications accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<SeriesEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit_reset(&mut self) {
        self.events.push(SeriesEvent::Reset {
            keys: self.timeseries.keys().cloned().collect(),
        });
    }
}

impl<F: SeriesFetcher> Drop for SeriesManager<F> {
    fn drop(&mut self) {
        self.abort_requests();
    }
}
