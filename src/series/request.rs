use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::core::{SeriesKey, Timeseries};
use crate::series::fetch::{FetchDescriptor, FetchOutcome, FetchTicket, SeriesFetcher};

/// Lifecycle of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Created,
    Active,
    Aborted,
    Completed,
}

/// Time window and resolution requested for one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestWindow {
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub sampling_period: u32,
    pub data_type: Option<String>,
}

/// One in-flight fetch for one Timeseries.
///
/// The request is bound to its series by key; the owner passes the series
/// back in on completion. Only an active request may mutate the series, so
/// outcomes delivered after `abort` or a previous completion are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRequest {
    ticket: FetchTicket,
    key: SeriesKey,
    window: RequestWindow,
    state: RequestState,
}

impl SeriesRequest {
    #[must_use]
    pub fn new(ticket: FetchTicket, key: SeriesKey, window: RequestWindow) -> Self {
        Self {
            ticket,
            key,
            window,
            state: RequestState::Created,
        }
    }

    #[must_use]
    pub fn ticket(&self) -> FetchTicket {
        self.ticket
    }

    #[must_use]
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    #[must_use]
    pub fn window(&self) -> &RequestWindow {
        &self.window
    }

    #[must_use]
    pub fn state(&self) -> RequestState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == RequestState::Active
    }

    #[must_use]
    pub fn descriptor(&self) -> FetchDescriptor {
        FetchDescriptor {
            id: self.key.observatory.clone(),
            elements: vec![self.key.element.clone()],
            starttime: self.window.starttime,
            endtime: self.window.endtime,
            sampling_period: self.window.sampling_period,
            data_type: self.window.data_type.clone(),
        }
    }

    /// Issues the fetch. A request already in flight is cancelled first so
    /// at most one fetch per request is ever outstanding.
    pub fn start<F: SeriesFetcher + ?Sized>(&mut self, fetcher: &mut F) {
        if self.is_active() {
            fetcher.cancel(self.ticket);
        }
        let descriptor = self.descriptor();
        debug!(
            ticket = %self.ticket,
            series = %self.key,
            sampling_period = descriptor.sampling_period,
            "issue series request"
        );
        fetcher.fetch(self.ticket, &descriptor);
        self.state = RequestState::Active;
    }

    /// Cancels the fetch if it is still in flight. Returns `true` when a
    /// cancellation was sent.
    pub fn abort<F: SeriesFetcher + ?Sized>(&mut self, fetcher: &mut F) -> bool {
        if !self.is_active() {
            return false;
        }
        trace!(ticket = %self.ticket, series = %self.key, "abort series request");
        fetcher.cancel(self.ticket);
        self.state = RequestState::Aborted;
        true
    }

    /// Applies a fetch outcome to the bound series.
    ///
    /// Returns `false` without touching the series when the request is not
    /// active. A successful response replaces times, values and metadata
    /// from its first channel; a failure, or a response that cannot be
    /// decoded, empties the data and records the error.
    pub fn complete(&mut self, timeseries: &mut Timeseries, outcome: FetchOutcome) -> bool {
        if !self.is_active() {
            trace!(
                ticket = %self.ticket,
                state = ?self.state,
                "drop outcome for inactive series request"
            );
            return false;
        }
        self.state = RequestState::Completed;

        match outcome {
            Ok(response) => {
                let applied = response.parse_times().and_then(|times| {
                    // No channel in the response means no samples for this one.
                    let (values, metadata) = match response.values.into_iter().next() {
                        Some(channel) => (channel.values, channel.metadata),
                        None => (
                            vec![None; times.len()],
                            Value::Object(serde_json::Map::new()),
                        ),
                    };
                    timeseries.set_data(times, values, metadata)
                });
                match applied {
                    Ok(()) => {
                        debug!(
                            ticket = %self.ticket,
                            series = %self.key,
                            samples = timeseries.len(),
                            "series request loaded"
                        );
                    }
                    Err(err) => {
                        warn!(
                            ticket = %self.ticket,
                            series = %self.key,
                            error = %err,
                            "series response rejected"
                        );
                        timeseries.set_error(err.to_string());
                    }
                }
            }
            Err(failure) => {
                warn!(
                    ticket = %self.ticket,
                    series = %self.key,
                    status = ?failure.status,
                    "series request failed"
                );
                timeseries.set_error(failure.display_message());
            }
        }
        true
    }
}
