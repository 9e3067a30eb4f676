use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Epoch milliseconds used as the numeric x domain of every chart.
#[must_use]
pub fn datetime_to_unix_millis(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64
}

#[must_use]
pub fn unix_millis_to_datetime(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    let rounded = millis.round();
    if rounded > i64::MAX as f64 || rounded < i64::MIN as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(rounded as i64)
}

/// Formats `YYYY-MM-DDTHH:MM:SSZ`, the form accepted by the data web service.
#[must_use]
pub fn format_iso8601(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Formats the time-of-day portion of an ISO timestamp.
///
/// Whole seconds render as `HH:MM:SS`; sub-second instants keep their
/// millisecond suffix (`HH:MM:SS.mmmZ`).
#[must_use]
pub fn format_iso_time_of_day(time: DateTime<Utc>) -> String {
    let iso = time.to_rfc3339_opts(SecondsFormat::Millis, true);
    let time_part = iso.split_once('T').map_or(iso.as_str(), |(_, rest)| rest);
    time_part.replace(".000Z", "")
}

/// Fixed-point formatting with ties rounded away from zero.
#[must_use]
pub fn format_fixed(value: f64, precision: u32) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    match Decimal::from_f64(value) {
        Some(decimal) => {
            let rounded =
                decimal.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.prec$}", prec = precision as usize)
        }
        None => format!("{value:.prec$}", prec = precision as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn iso_time_of_day_strips_zero_millis() {
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 7, 5, 9).unwrap();
        assert_eq!(format_iso_time_of_day(time), "07:05:09");
    }

    #[test]
    fn iso_time_of_day_keeps_nonzero_millis() {
        let time = Utc.timestamp_millis_opt(1_709_276_709_250).unwrap();
        assert_eq!(format_iso_time_of_day(time), "07:05:09.250Z");
    }

    #[test]
    fn fixed_format_rounds_ties_away_from_zero() {
        assert_eq!(format_fixed(0.25, 1), "0.3");
        assert_eq!(format_fixed(-0.25, 1), "-0.3");
        assert_eq!(format_fixed(12.0, 1), "12.0");
    }

    #[test]
    fn millis_round_trip() {
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let millis = datetime_to_unix_millis(time);
        assert_eq!(unix_millis_to_datetime(millis), Some(time));
        assert_eq!(unix_millis_to_datetime(f64::NAN), None);
    }
}
