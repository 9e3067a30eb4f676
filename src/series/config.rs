use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::core::SeriesKey;
use crate::error::ChartResult;

/// Desired selection and time window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeriesConfig {
    #[serde(default)]
    pub elements: Vec<String>,
    #[serde(default)]
    pub observatories: Vec<String>,
    #[serde(default)]
    pub starttime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub endtime: Option<DateTime<Utc>>,
}

impl SeriesConfig {
    pub fn from_json_str(json: &str) -> ChartResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Applies a partial update and reports which aspects actually changed.
    pub fn apply(&mut self, update: ConfigUpdate) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        if let Some(elements) = update.elements {
            if elements != self.elements {
                self.elements = elements;
                changes.membership = true;
            }
        }
        if let Some(observatories) = update.observatories {
            if observatories != self.observatories {
                self.observatories = observatories;
                changes.membership = true;
            }
        }
        if let Some(starttime) = update.starttime {
            if starttime != self.starttime {
                self.starttime = starttime;
                changes.window = true;
            }
        }
        if let Some(endtime) = update.endtime {
            if endtime != self.endtime {
                self.endtime = endtime;
                changes.window = true;
            }
        }

        changes
    }

    /// Cross product of elements and observatories, without duplicates,
    /// elements outermost.
    #[must_use]
    pub fn desired_keys(&self) -> Vec<SeriesKey> {
        let elements: IndexSet<&String> = self.elements.iter().collect();
        let observatories: IndexSet<&String> = self.observatories.iter().collect();
        elements
            .iter()
            .flat_map(|element| {
                observatories
                    .iter()
                    .map(move |observatory| SeriesKey::new(*observatory, *element))
            })
            .collect()
    }

    /// The requested window when both bounds are present and ordered.
    #[must_use]
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.starttime, self.endtime) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }
}

/// Partial configuration change; `None` fields are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigUpdate {
    pub elements: Option<Vec<String>>,
    pub observatories: Option<Vec<String>>,
    pub starttime: Option<Option<DateTime<Utc>>>,
    pub endtime: Option<Option<DateTime<Utc>>>,
}

impl ConfigUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements = Some(elements.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn observatories<I, S>(mut self, observatories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.observatories = Some(observatories.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn window(mut self, starttime: DateTime<Utc>, endtime: DateTime<Utc>) -> Self {
        self.starttime = Some(Some(starttime));
        self.endtime = Some(Some(endtime));
        self
    }

    #[must_use]
    pub fn starttime(mut self, starttime: Option<DateTime<Utc>>) -> Self {
        self.starttime = Some(starttime);
        self
    }

    #[must_use]
    pub fn endtime(mut self, endtime: Option<DateTime<Utc>>) -> Self {
        self.endtime = Some(endtime);
        self
    }
}

impl From<SeriesConfig> for ConfigUpdate {
    fn from(config: SeriesConfig) -> Self {
        Self {
            elements: Some(config.elements),
            observatories: Some(config.observatories),
            starttime: Some(config.starttime),
            endtime: Some(config.endtime),
        }
    }
}

/// Which aspects of the configuration changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfigChanges {
    /// Elements or observatories changed.
    pub membership: bool,
    /// Start or end time changed.
    pub window: bool,
}

impl ConfigChanges {
    #[must_use]
    pub fn all() -> Self {
        Self {
            membership: true,
            window: true,
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        !self.membership && !self.window
    }
}
