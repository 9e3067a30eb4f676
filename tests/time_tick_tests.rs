use chrono::{DateTime, TimeZone, Utc};
use geomag_chart::api::{format_time_tick, time_ticks};
use geomag_chart::core::datetime_to_unix_millis;

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid time")
}

fn labels(start: DateTime<Utc>, end: DateTime<Utc>, count: usize) -> Vec<String> {
    time_ticks(
        (datetime_to_unix_millis(start), datetime_to_unix_millis(end)),
        count,
    )
    .into_iter()
    .map(|tick| tick.label)
    .collect()
}

#[test]
fn labels_use_coarsest_boundary() {
    assert_eq!(format_time_tick(at(2024, 1, 1, 0, 0, 0)), "2024");
    assert_eq!(format_time_tick(at(2024, 3, 1, 0, 0, 0)), "Mar");
    assert_eq!(format_time_tick(at(2024, 3, 3, 0, 0, 0)), "Mar  3");
    assert_eq!(format_time_tick(at(2024, 3, 5, 0, 0, 0)), "Tue  5");
    assert_eq!(format_time_tick(at(2024, 3, 5, 14, 0, 0)), "14:00");
    assert_eq!(format_time_tick(at(2024, 3, 5, 14, 25, 0)), "14:25");
    assert_eq!(format_time_tick(at(2024, 3, 5, 14, 25, 30)), ":30");
}

#[test]
fn one_day_domain_ticks_every_six_hours() {
    let ticks = labels(at(2024, 1, 2, 0, 0, 0), at(2024, 1, 3, 0, 0, 0), 5);
    assert_eq!(ticks, ["Tue  2", "06:00", "12:00", "18:00", "Wed  3"]);
}

#[test]
fn realtime_domain_ticks_every_five_minutes() {
    let ticks = labels(at(2024, 1, 2, 10, 0, 0), at(2024, 1, 2, 10, 15, 0), 5);
    assert_eq!(ticks, ["10:00", "10:05", "10:10", "10:15"]);
}

#[test]
fn ticks_stay_inside_domain() {
    let start = at(2024, 1, 2, 10, 3, 17);
    let end = at(2024, 1, 2, 13, 41, 2);
    let ticks = time_ticks(
        (datetime_to_unix_millis(start), datetime_to_unix_millis(end)),
        5,
    );
    assert!(!ticks.is_empty());
    assert!(ticks.iter().all(|tick| tick.time >= start && tick.time <= end));
    assert!(ticks.windows(2).all(|pair| pair[0].time < pair[1].time));
}

#[test]
fn reversed_domain_matches_forward_domain() {
    let start = datetime_to_unix_millis(at(2024, 1, 2, 0, 0, 0));
    let end = datetime_to_unix_millis(at(2024, 1, 3, 0, 0, 0));
    assert_eq!(time_ticks((end, start), 5), time_ticks((start, end), 5));
}

#[test]
fn degenerate_requests_produce_no_ticks() {
    assert!(time_ticks((0.0, 1e9), 0).is_empty());
    assert!(time_ticks((f64::NAN, 1e9), 5).is_empty());
}

#[test]
fn multi_year_domain_ticks_on_years() {
    let ticks = time_ticks(
        (
            datetime_to_unix_millis(at(2000, 6, 1, 0, 0, 0)),
            datetime_to_unix_millis(at(2020, 6, 1, 0, 0, 0)),
        ),
        5,
    );
    assert!(!ticks.is_empty());
    assert!(ticks.iter().all(|tick| tick.label.len() == 4));
}
