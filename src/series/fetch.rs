use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::{SeriesId, Timeseries, format_iso8601};
use crate::error::{ChartError, ChartResult};

/// Error text recorded on a series when a failure carries no message.
pub const DEFAULT_FETCH_ERROR: &str = "Error fetching data";

/// Generation token identifying one issued fetch.
///
/// Tickets are never reused, so a completion carrying a ticket that is no
/// longer pending belongs to a superseded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FetchTicket(pub u64);

impl fmt::Display for FetchTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Parameters of one data request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchDescriptor {
    /// Observatory id.
    pub id: String,
    pub elements: Vec<String>,
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    pub sampling_period: u32,
    #[serde(default)]
    pub data_type: Option<String>,
}

impl FetchDescriptor {
    /// Query parameters understood by the data web service.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(7);
        if !self.id.is_empty() {
            pairs.push(("id", self.id.clone()));
        }
        pairs.push(("starttime", format_iso8601(self.starttime)));
        pairs.push(("endtime", format_iso8601(self.endtime)));
        if !self.elements.is_empty() {
            pairs.push(("elements", self.elements.join(",")));
        }
        if self.sampling_period > 0 {
            pairs.push(("sampling_period", self.sampling_period.to_string()));
        }
        if let Some(data_type) = &self.data_type {
            pairs.push(("type", data_type.clone()));
        }
        pairs.push(("format", "json".to_owned()));
        pairs
    }

    /// URL-encoded query string, without the leading `?`.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Values for one channel in a data response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelValues {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

/// Parsed data response: one shared time axis and per-channel values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchResponse {
    #[serde(default)]
    pub times: Vec<String>,
    #[serde(default)]
    pub values: Vec<ChannelValues>,
}

impl FetchResponse {
    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decodes the ISO-8601 time axis.
    pub fn parse_times(&self) -> ChartResult<Vec<DateTime<Utc>>> {
        self.times
            .iter()
            .map(|time| {
                DateTime::parse_from_rfc3339(time)
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .map_err(|err| ChartError::Parse(format!("invalid time `{time}`: {err}")))
            })
            .collect()
    }

    /// Converts every channel into a standalone series with a sequence id.
    pub fn timeseries(&self) -> ChartResult<Vec<Timeseries>> {
        let times = self.parse_times()?;
        self.values
            .iter()
            .map(|channel| {
                let metadata = json!({
                    "observatory": channel.metadata.get("station").cloned().unwrap_or(Value::Null),
                    "channel": channel.metadata.get("element").cloned().unwrap_or(Value::Null),
                });
                let mut series = Timeseries::new(SeriesId::next_sequence());
                series.set_data(times.clone(), channel.values.clone(), metadata)?;
                Ok(series)
            })
            .collect()
    }
}

/// Failure reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FetchFailure {
    pub status: Option<u16>,
    pub message: Option<String>,
}

impl FetchFailure {
    #[must_use]
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }

    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            message: None,
        }
    }

    /// Message recorded on the series; never empty.
    #[must_use]
    pub fn display_message(&self) -> String {
        self.message
            .as_deref()
            .filter(|message| !message.is_empty())
            .unwrap_or(DEFAULT_FETCH_ERROR)
            .to_owned()
    }
}

impl From<FetchFailure> for ChartError {
    fn from(failure: FetchFailure) -> Self {
        let message = failure.display_message();
        Self::Fetch {
            status: failure.status,
            message,
        }
    }
}

pub type FetchOutcome = Result<FetchResponse, FetchFailure>;

/// Asynchronous fetch capability supplied by the host.
///
/// `fetch` must not complete synchronously: the host delivers the outcome
/// later through `SeriesManager::complete` with the same ticket. `cancel` is
/// best effort; the manager discards anything delivered for a cancelled
/// ticket regardless.
pub trait SeriesFetcher {
    fn fetch(&mut self, ticket: FetchTicket, descriptor: &FetchDescriptor);
    fn cancel(&mut self, ticket: FetchTicket);
}

impl<F: SeriesFetcher + ?Sized> SeriesFetcher for Box<F> {
    fn fetch(&mut self, ticket: FetchTicket, descriptor: &FetchDescriptor) {
        (**self).fetch(ticket, descriptor);
    }

    fn cancel(&mut self, ticket: FetchTicket) {
        (**self).cancel(ticket);
    }
}
