use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::series::config::{ConfigChanges, ConfigUpdate};
use crate::series::fetch::SeriesFetcher;
use crate::series::manager::SeriesManager;

const REALTIME_WINDOW_MINUTES: i64 = 15;
const REALTIME_ROUNDING_MINUTES: i64 = 1;
const REALTIME_REFRESH_SECONDS: i64 = 60;
const PAST_DAY_WINDOW_HOURS: i64 = 24;
const PAST_DAY_ROUNDING_MINUTES: i64 = 5;
const PAST_DAY_REFRESH_SECONDS: i64 = 5 * 60;

/// How the displayed time window is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Past 15 minutes, ending at the next whole minute.
    Realtime,
    /// Past 24 hours, ending at the next 5-minute boundary.
    PastDay,
    /// Fixed window chosen by the user.
    Custom {
        starttime: DateTime<Utc>,
        endtime: DateTime<Utc>,
    },
}

/// A time window derived from a mode at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub starttime: DateTime<Utc>,
    pub endtime: DateTime<Utc>,
    /// Delay before the window should be re-derived; `None` for fixed windows.
    pub refresh: Option<TimeDelta>,
}

impl TimeMode {
    #[must_use]
    pub fn resolve(self, now: DateTime<Utc>) -> ResolvedWindow {
        match self {
            Self::Realtime => {
                let endtime = round_up_to_minutes(now, REALTIME_ROUNDING_MINUTES);
                ResolvedWindow {
                    starttime: endtime - TimeDelta::minutes(REALTIME_WINDOW_MINUTES),
                    endtime,
                    refresh: Some(TimeDelta::seconds(REALTIME_REFRESH_SECONDS)),
                }
            }
            Self::PastDay => {
                let endtime = round_up_to_minutes(now, PAST_DAY_ROUNDING_MINUTES);
                ResolvedWindow {
                    starttime: endtime - TimeDelta::hours(PAST_DAY_WINDOW_HOURS),
                    endtime,
                    refresh: Some(TimeDelta::seconds(PAST_DAY_REFRESH_SECONDS)),
                }
            }
            Self::Custom { starttime, endtime } => ResolvedWindow {
                starttime,
                endtime,
                refresh: None,
            },
        }
    }

    #[must_use]
    pub fn is_relative(self) -> bool {
        !matches!(self, Self::Custom { .. })
    }
}

/// Rounds up to the next `n`-minute boundary of the hour.
///
/// Seconds are discarded first, so an instant already on a boundary moves to
/// the following one.
#[must_use]
pub fn round_up_to_minutes(time: DateTime<Utc>, n: i64) -> DateTime<Utc> {
    let n = n.max(1);
    let Ok(hour) = time.duration_trunc(TimeDelta::hours(1)) else {
        return time;
    };
    let minute = (time - hour).num_minutes();
    hour + TimeDelta::minutes(n * ((minute + n) / n))
}

/// Re-derives relative windows on a timer and feeds them to a manager.
///
/// The host calls [`AutoUpdater::poll`] from its timer; every update goes
/// through [`SeriesManager::update_config`] like any user change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoUpdater {
    mode: TimeMode,
    next_due: Option<DateTime<Utc>>,
}

impl AutoUpdater {
    #[must_use]
    pub fn new(mode: TimeMode) -> Self {
        Self {
            mode,
            next_due: None,
        }
    }

    #[must_use]
    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    /// When the next tick is due; `None` for fixed windows.
    #[must_use]
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// Switches mode and applies it immediately.
    pub fn set_mode<F: SeriesFetcher>(
        &mut self,
        mode: TimeMode,
        now: DateTime<Utc>,
        manager: &mut SeriesManager<F>,
    ) -> ResolvedWindow {
        self.mode = mode;
        self.tick(now, manager)
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_due.is_some_and(|due| now >= due)
    }

    /// Ticks when due; returns the applied window.
    pub fn poll<F: SeriesFetcher>(
        &mut self,
        now: DateTime<Utc>,
        manager: &mut SeriesManager<F>,
    ) -> Option<ResolvedWindow> {
        self.is_due(now).then(|| self.tick(now, manager))
    }

    /// Re-derives the window from `now` and reconciles it.
    ///
    /// A tick that lands on an unchanged window still refetches so series
    /// that failed last time are retried.
    pub fn tick<F: SeriesFetcher>(
        &mut self,
        now: DateTime<Utc>,
        manager: &mut SeriesManager<F>,
    ) -> ResolvedWindow {
        let window = self.mode.resolve(now);
        if window.endtime < window.starttime {
            warn!(mode = ?self.mode, "time mode resolved to an inverted window");
        }

        let changes = manager
            .update_config(ConfigUpdate::new().window(window.starttime, window.endtime));
        if changes.is_empty() && self.mode.is_relative() {
            manager.on_config_change(ConfigChanges {
                membership: false,
                window: true,
            });
        }

        self.next_due = window.refresh.map(|refresh| now + refresh);
        debug!(
            mode = ?self.mode,
            starttime = %window.starttime,
            endtime = %window.endtime,
            next_due = ?self.next_due,
            "auto update tick"
        );
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rounds_up_to_next_boundary() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 7, 30).unwrap();
        assert_eq!(
            round_up_to_minutes(t, 5),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 10, 0).unwrap()
        );
        assert_eq!(
            round_up_to_minutes(t, 1),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 8, 0).unwrap()
        );
    }

    #[test]
    fn boundary_instant_moves_to_following_boundary() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 10, 0).unwrap();
        assert_eq!(
            round_up_to_minutes(t, 5),
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn rounding_crosses_hour_and_day() {
        let t = Utc.with_ymd_and_hms(2024, 12, 31, 23, 58, 0).unwrap();
        assert_eq!(
            round_up_to_minutes(t, 5),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
