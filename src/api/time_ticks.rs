use chrono::{DateTime, Datelike, Months, TimeDelta, TimeZone, Timelike, Utc};

use crate::core::unix_millis_to_datetime;

const MILLIS_PER_YEAR: f64 = 31_536e6;

/// Calendar unit a tick sequence steps through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInterval {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// Candidate tick spacings, ordered by nominal duration in milliseconds.
const TICK_STEPS: [(TimeInterval, u32, f64); 18] = [
    (TimeInterval::Second, 1, 1e3),
    (TimeInterval::Second, 5, 5e3),
    (TimeInterval::Second, 15, 15e3),
    (TimeInterval::Second, 30, 3e4),
    (TimeInterval::Minute, 1, 6e4),
    (TimeInterval::Minute, 5, 3e5),
    (TimeInterval::Minute, 15, 9e5),
    (TimeInterval::Minute, 30, 18e5),
    (TimeInterval::Hour, 1, 36e5),
    (TimeInterval::Hour, 3, 108e5),
    (TimeInterval::Hour, 6, 216e5),
    (TimeInterval::Hour, 12, 432e5),
    (TimeInterval::Day, 1, 864e5),
    (TimeInterval::Day, 2, 1728e5),
    (TimeInterval::Week, 1, 6048e5),
    (TimeInterval::Month, 1, 2592e6),
    (TimeInterval::Month, 3, 7776e6),
    (TimeInterval::Year, 1, MILLIS_PER_YEAR),
];

impl TimeInterval {
    fn floor(self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let (year, month, day) = (time.year(), time.month(), time.day());
        let (hour, minute, second) = (time.hour(), time.minute(), time.second());
        let floored = match self {
            Self::Second => Utc.with_ymd_and_hms(year, month, day, hour, minute, second),
            Self::Minute => Utc.with_ymd_and_hms(year, month, day, hour, minute, 0),
            Self::Hour => Utc.with_ymd_and_hms(year, month, day, hour, 0, 0),
            Self::Day | Self::Week => Utc.with_ymd_and_hms(year, month, day, 0, 0, 0),
            Self::Month => Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0),
            Self::Year => Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0),
        }
        .single()?;
        if self == Self::Week {
            let since_sunday = i64::from(floored.weekday().num_days_from_sunday());
            return floored.checked_sub_signed(TimeDelta::days(since_sunday));
        }
        Some(floored)
    }

    fn next(self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Second => time.checked_add_signed(TimeDelta::seconds(1)),
            Self::Minute => time.checked_add_signed(TimeDelta::minutes(1)),
            Self::Hour => time.checked_add_signed(TimeDelta::hours(1)),
            Self::Day => time.checked_add_signed(TimeDelta::days(1)),
            Self::Week => time.checked_add_signed(TimeDelta::weeks(1)),
            Self::Month => time.checked_add_months(Months::new(1)),
            Self::Year => time.checked_add_months(Months::new(12)),
        }
    }

    fn ceil(self, time: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let floored = self.floor(time.checked_sub_signed(TimeDelta::milliseconds(1))?)?;
        self.next(floored)
    }

    /// Field a tick step must divide for the tick to be kept.
    fn number(self, time: DateTime<Utc>) -> i64 {
        match self {
            Self::Second => i64::from(time.second()),
            Self::Minute => i64::from(time.minute()),
            Self::Hour => i64::from(time.hour()),
            Self::Day => i64::from(time.day()) - 1,
            Self::Week => 0,
            Self::Month => i64::from(time.month0()),
            Self::Year => i64::from(time.year()),
        }
    }

    /// Boundaries in `[start, end]` whose field is a multiple of `step`.
    fn range(self, start: DateTime<Utc>, end: DateTime<Utc>, step: u32) -> Vec<DateTime<Utc>> {
        let step = i64::from(step.max(1));
        let mut ticks = Vec::new();
        let mut cursor = self.ceil(start);
        while let Some(time) = cursor {
            if time > end {
                break;
            }
            if self.number(time).rem_euclid(step) == 0 {
                ticks.push(time);
            }
            cursor = self.next(time);
        }
        ticks
    }
}

/// One x-axis tick and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTick {
    pub time: DateTime<Utc>,
    pub label: String,
}

/// Roughly `count` ticks on calendar boundaries inside a millisecond domain.
#[must_use]
pub fn time_ticks(domain: (f64, f64), count: usize) -> Vec<TimeTick> {
    let (start, end) = if domain.0 <= domain.1 {
        domain
    } else {
        (domain.1, domain.0)
    };
    if !start.is_finite() || !end.is_finite() || count == 0 {
        return Vec::new();
    }
    let count = count as f64;
    let target = (end - start) / count;
    let index = TICK_STEPS.partition_point(|(_, _, millis)| *millis <= target);

    let times = if index == 0 {
        millisecond_ticks(start, end, count)
    } else {
        let (interval, step) = if index == TICK_STEPS.len() {
            let years = linear_tick_step(start / MILLIS_PER_YEAR, end / MILLIS_PER_YEAR, count);
            (TimeInterval::Year, years.max(1.0) as u32)
        } else {
            let (lower, upper) = (TICK_STEPS[index - 1], TICK_STEPS[index]);
            let chosen = if target / lower.2 < upper.2 / target {
                lower
            } else {
                upper
            };
            (chosen.0, chosen.1)
        };
        match (unix_millis_to_datetime(start), unix_millis_to_datetime(end)) {
            (Some(start), Some(end)) => interval.range(start, end, step),
            _ => Vec::new(),
        }
    };

    times
        .into_iter()
        .map(|time| TimeTick {
            label: format_time_tick(time),
            time,
        })
        .collect()
}

fn millisecond_ticks(start: f64, end: f64, count: f64) -> Vec<DateTime<Utc>> {
    let step = linear_tick_step(start, end, count);
    if !step.is_finite() || step <= 0.0 {
        return unix_millis_to_datetime(start).into_iter().collect();
    }
    let first = (start / step).ceil() as i64;
    let last = (end / step).floor() as i64;
    (first..=last)
        .filter_map(|i| unix_millis_to_datetime(i as f64 * step))
        .collect()
}

fn linear_tick_step(start: f64, end: f64, count: f64) -> f64 {
    let span = end - start;
    let mut step = 10f64.powf((span / count).log10().floor());
    let error = count / span * step;
    if error <= 0.15 {
        step *= 10.0;
    } else if error <= 0.35 {
        step *= 5.0;
    } else if error <= 0.75 {
        step *= 2.0;
    }
    step
}

/// Label for a tick, chosen by the coarsest calendar boundary it sits on.
#[must_use]
pub fn format_time_tick(time: DateTime<Utc>) -> String {
    let pattern = if time.second() != 0 {
        ":%S"
    } else if time.minute() != 0 {
        "%H:%M"
    } else if time.hour() != 0 {
        "%H:00"
    } else if time.weekday().num_days_from_sunday() != 0 && time.day() != 1 {
        "%a %e"
    } else if time.day() != 1 {
        "%b %e"
    } else if time.month0() != 0 {
        "%b"
    } else {
        "%Y"
    };
    time.format(pattern).to_string()
}
