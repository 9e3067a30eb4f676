use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::catalog::{DEFAULT_UNITS, Element, Observatory};
use crate::error::{ChartError, ChartResult};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

fn next_instance() -> u64 {
    NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed)
}

/// Stable identity of one (observatory, element) selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub observatory: String,
    pub element: String,
}

impl SeriesKey {
    #[must_use]
    pub fn new(observatory: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            observatory: observatory.into(),
            element: element.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.observatory, self.element)
    }
}

/// Identity of a Timeseries.
///
/// Managed series are keyed by their selection pair. Series decoded from a
/// standalone response carry a sequence number instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesId {
    Pair(SeriesKey),
    Sequence(u64),
}

impl SeriesId {
    #[must_use]
    pub fn next_sequence() -> Self {
        Self::Sequence(next_instance())
    }

    #[must_use]
    pub fn key(&self) -> Option<&SeriesKey> {
        match self {
            Self::Pair(key) => Some(key),
            Self::Sequence(_) => None,
        }
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair(key) => key.fmt(f),
            Self::Sequence(sequence) => write!(f, "{sequence}"),
        }
    }
}

/// A maximal run of consecutive missing samples.
///
/// `start`/`end` are the timestamps of the first and last missing sample;
/// the indices address the same samples in the owning series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub start_index: usize,
    pub end_index: usize,
}

/// One element-observatory pair's ordered sample data over a time window.
///
/// Data fields are mutated in place by fetch completion so that everything
/// bound to the series (by id or instance handle) stays valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeseries {
    id: SeriesId,
    instance: u64,
    element: Option<Element>,
    observatory: Option<Observatory>,
    times: Vec<DateTime<Utc>>,
    values: Vec<Option<f64>>,
    metadata: Value,
    error: Option<String>,
    revision: u64,
}

impl Timeseries {
    /// Creates an empty series.
    #[must_use]
    pub fn new(id: SeriesId) -> Self {
        Self {
            id,
            instance: next_instance(),
            element: None,
            observatory: None,
            times: Vec::new(),
            values: Vec::new(),
            metadata: Value::Null,
            error: None,
            revision: 0,
        }
    }

    /// Creates a series holding the given samples.
    pub fn from_samples(
        id: SeriesId,
        times: Vec<DateTime<Utc>>,
        values: Vec<Option<f64>>,
    ) -> ChartResult<Self> {
        let mut series = Self::new(id);
        series.set_data(times, values, Value::Null)?;
        Ok(series)
    }

    #[must_use]
    pub fn with_descriptors(
        mut self,
        element: Option<Element>,
        observatory: Option<Observatory>,
    ) -> Self {
        self.element = element;
        self.observatory = observatory;
        self
    }

    #[must_use]
    pub fn id(&self) -> &SeriesId {
        &self.id
    }

    #[must_use]
    pub fn key(&self) -> Option<&SeriesKey> {
        self.id.key()
    }

    /// Process-unique handle assigned at construction.
    ///
    /// Two references to the same logical entity always report the same
    /// instance; a re-created entity never does.
    #[must_use]
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// Incremented on every data mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn element(&self) -> Option<&Element> {
        self.element.as_ref()
    }

    #[must_use]
    pub fn observatory(&self) -> Option<&Observatory> {
        self.observatory.as_ref()
    }

    pub fn set_descriptors(&mut self, element: Option<Element>, observatory: Option<Observatory>) {
        self.element = element;
        self.observatory = observatory;
    }

    #[must_use]
    pub fn units(&self) -> &str {
        self.element.as_ref().map_or(DEFAULT_UNITS, Element::units)
    }

    #[must_use]
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    #[must_use]
    pub fn metadata(&self) -> &Value {
        &self.metadata
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// First and last sample time.
    #[must_use]
    pub fn time_extent(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// Replaces samples and metadata, clearing any error.
    ///
    /// Non-finite values are stored as missing samples. Rejects length
    /// mismatches and decreasing times, leaving the series untouched.
    pub fn set_data(
        &mut self,
        times: Vec<DateTime<Utc>>,
        values: Vec<Option<f64>>,
        metadata: Value,
    ) -> ChartResult<()> {
        if times.len() != values.len() {
            return Err(ChartError::InvalidData(format!(
                "times/values length mismatch: {} times, {} values",
                times.len(),
                values.len()
            )));
        }
        if times.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ChartError::InvalidData(
                "sample times must be non-decreasing".to_owned(),
            ));
        }

        self.times = times;
        self.values = values
            .into_iter()
            .map(|value| value.filter(|v| v.is_finite()))
            .collect();
        self.metadata = metadata;
        self.error = None;
        self.revision += 1;
        Ok(())
    }

    /// Records a failed load: data is emptied and `error` set.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.times.clear();
        self.values.clear();
        self.metadata = Value::Object(serde_json::Map::new());
        self.error = Some(message.into());
        self.revision += 1;
    }

    /// Empties the series without marking it as failed.
    pub fn clear(&mut self) {
        self.times.clear();
        self.values.clear();
        self.metadata = Value::Null;
        self.error = None;
        self.revision += 1;
    }

    /// Finds every maximal run of missing samples in one pass.
    ///
    /// A run reaching the end of the series is closed at the last sample.
    #[must_use]
    pub fn get_gaps(&self) -> Vec<Gap> {
        let mut gaps = Vec::new();
        let mut gap_start: Option<usize> = None;

        for (index, value) in self.values.iter().enumerate() {
            match (value, gap_start) {
                (None, None) => gap_start = Some(index),
                (Some(_), Some(start)) => {
                    gaps.push(self.gap(start, index - 1));
                    gap_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = gap_start {
            gaps.push(self.gap(start, self.values.len() - 1));
        }

        gaps
    }

    fn gap(&self, start_index: usize, end_index: usize) -> Gap {
        Gap {
            start: self.times[start_index],
            end: self.times[end_index],
            start_index,
            end_index,
        }
    }
}
