use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use geomag_chart::core::{Catalog, Element, Observatory, SeriesKey};
use geomag_chart::series::{
    ChannelValues, ConfigUpdate, DEFAULT_FETCH_ERROR, FetchDescriptor, FetchFailure,
    FetchResponse, FetchTicket, SeriesEvent, SeriesFetcher, SeriesManager,
};
use serde_json::json;

#[derive(Debug, Default)]
struct FetchLog {
    issued: Vec<(FetchTicket, FetchDescriptor)>,
    cancelled: Vec<FetchTicket>,
}

#[derive(Debug, Clone, Default)]
struct RecordingFetcher {
    log: Rc<RefCell<FetchLog>>,
}

impl SeriesFetcher for RecordingFetcher {
    fn fetch(&mut self, ticket: FetchTicket, descriptor: &FetchDescriptor) {
        self.log.borrow_mut().issued.push((ticket, descriptor.clone()));
    }

    fn cancel(&mut self, ticket: FetchTicket) {
        self.log.borrow_mut().cancelled.push(ticket);
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0)
        .single()
        .expect("valid time")
}

fn manager() -> (SeriesManager<RecordingFetcher>, Rc<RefCell<FetchLog>>) {
    let fetcher = RecordingFetcher::default();
    let log = Rc::clone(&fetcher.log);
    (SeriesManager::new(fetcher, Catalog::new()), log)
}

fn response(values: Vec<Option<f64>>) -> FetchResponse {
    let times = (0..values.len())
        .map(|i| format!("2024-03-01T00:{i:02}:00.000Z"))
        .collect();
    FetchResponse {
        times,
        values: vec![ChannelValues {
            id: Some("H".to_owned()),
            metadata: json!({ "station": "BOU", "element": "H" }),
            values,
        }],
    }
}

fn key(observatory: &str, element: &str) -> SeriesKey {
    SeriesKey::new(observatory, element)
}

#[test]
fn membership_change_preserves_identity_of_kept_series() {
    let (mut manager, _log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["A", "B"])
            .observatories(["X"])
            .window(at(0, 0), at(1, 0)),
    );
    let kept = key("X", "A");
    let instance = manager.get(&kept).expect("A_X managed").instance();
    let ticket = manager.pending_ticket_for(&kept).expect("A_X pending");
    manager
        .complete(ticket, Ok(response(vec![Some(1.0), Some(2.0)])))
        .expect("current ticket applies");

    manager.update_config(ConfigUpdate::new().elements(["A"]).observatories(["X", "Y"]));

    let keys: Vec<SeriesKey> = manager.keys().cloned().collect();
    assert_eq!(keys, vec![key("X", "A"), key("Y", "A")]);
    let series = manager.get(&kept).expect("A_X still managed");
    assert_eq!(series.instance(), instance);
    assert_eq!(series.len(), 2);
}

#[test]
fn reconciliation_emits_a_single_reset() {
    let (mut manager, _log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H", "E", "Z"])
            .observatories(["BOU", "FRD"])
            .window(at(0, 0), at(1, 0)),
    );

    let resets: Vec<SeriesEvent> = manager
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, SeriesEvent::Reset { .. }))
        .collect();
    assert_eq!(resets.len(), 1);
    let SeriesEvent::Reset { keys } = &resets[0] else {
        unreachable!("filtered to resets");
    };
    assert_eq!(keys.len(), 6);
}

#[test]
fn window_only_change_refetches_every_series_without_reset() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H", "Z"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let instances: Vec<u64> = manager.timeseries().map(|series| series.instance()).collect();
    let first_tickets: Vec<FetchTicket> = manager.pending_tickets().collect();
    manager.drain_events();

    let changes = manager.update_config(ConfigUpdate::new().window(at(2, 0), at(3, 0)));
    assert!(changes.window && !changes.membership);

    assert_eq!(manager.pending_count(), 2);
    assert_eq!(log.borrow().issued.len(), 4);
    assert_eq!(log.borrow().cancelled, first_tickets);
    for (_, descriptor) in &log.borrow().issued[2..] {
        assert_eq!(descriptor.starttime, at(2, 0));
        assert_eq!(descriptor.endtime, at(3, 0));
    }
    let after: Vec<u64> = manager.timeseries().map(|series| series.instance()).collect();
    assert_eq!(after, instances);
    assert!(
        manager
            .drain_events()
            .iter()
            .all(|event| !matches!(event, SeriesEvent::Reset { .. }))
    );
}

#[test]
fn superseded_response_never_mutates_series() {
    let (mut manager, _log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let series_key = key("BOU", "H");
    let first = manager.pending_ticket_for(&series_key).expect("C1 pending");

    manager.update_config(ConfigUpdate::new().window(at(1, 0), at(2, 0)));
    let second = manager.pending_ticket_for(&series_key).expect("C2 pending");
    assert_ne!(first, second);

    assert!(manager.complete(first, Ok(response(vec![Some(9.0)]))).is_none());
    let series = manager.get(&series_key).expect("managed");
    assert!(series.is_empty());
    assert_eq!(series.revision(), 0);

    assert_eq!(
        manager.complete(second, Ok(response(vec![Some(1.0), Some(2.0)]))),
        Some(series_key.clone())
    );
    assert_eq!(manager.get(&series_key).expect("managed").len(), 2);

    // A late duplicate of either ticket is dropped.
    assert!(manager.complete(first, Ok(response(vec![Some(9.0)]))).is_none());
    assert!(manager.complete(second, Ok(response(vec![Some(9.0)]))).is_none());
    assert_eq!(manager.get(&series_key).expect("managed").values(), &[Some(1.0), Some(2.0)]);
}

#[test]
fn fetch_failure_is_recorded_on_the_series() {
    let (mut manager, _log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H", "Z"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let h = manager.pending_ticket_for(&key("BOU", "H")).expect("H pending");
    let z = manager.pending_ticket_for(&key("BOU", "Z")).expect("Z pending");

    manager.complete(h, Err(FetchFailure::status(503)));
    manager.complete(z, Err(FetchFailure::new(Some(404), "no such channel")));

    let h_series = manager.get(&key("BOU", "H")).expect("managed");
    assert_eq!(h_series.error(), Some(DEFAULT_FETCH_ERROR));
    assert!(h_series.is_empty());
    assert_eq!(
        manager.get(&key("BOU", "Z")).expect("managed").error(),
        Some("no such channel")
    );
    assert_eq!(manager.pending_count(), 0);
}

#[test]
fn next_reconciliation_retries_failed_series() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let ticket = manager.pending_ticket_for(&key("BOU", "H")).expect("pending");
    manager.complete(ticket, Err(FetchFailure::status(500)));

    manager.refresh();
    assert_eq!(log.borrow().issued.len(), 2);
    let retry = manager.pending_ticket_for(&key("BOU", "H")).expect("retry pending");
    manager.complete(retry, Ok(response(vec![Some(4.0)])));
    assert!(!manager.get(&key("BOU", "H")).expect("managed").has_error());
}

#[test]
fn malformed_window_clears_series_and_issues_nothing() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let ticket = manager.pending_ticket_for(&key("BOU", "H")).expect("pending");
    manager.complete(ticket, Ok(response(vec![Some(1.0), None])));

    manager.update_config(ConfigUpdate::new().window(at(5, 0), at(4, 0)));

    assert_eq!(manager.pending_count(), 0);
    assert_eq!(log.borrow().issued.len(), 1);
    let series = manager.get(&key("BOU", "H")).expect("still managed");
    assert!(series.is_empty());
    assert!(!series.has_error());
    assert!(series.get_gaps().is_empty());
}

#[test]
fn missing_endtime_issues_nothing() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .starttime(Some(at(0, 0))),
    );
    assert_eq!(manager.len(), 1);
    assert!(log.borrow().issued.is_empty());
}

#[test]
fn sampling_period_switches_at_thirty_minutes() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .window(at(0, 0), at(0, 30)),
    );
    manager.update_config(ConfigUpdate::new().window(at(0, 0), at(0, 31)));

    let periods: Vec<u32> = log
        .borrow()
        .issued
        .iter()
        .map(|(_, descriptor)| descriptor.sampling_period)
        .collect();
    assert_eq!(periods, vec![1, 60]);
}

#[test]
fn series_are_ordered_by_latitude_then_id_then_element_order() {
    let catalog = Catalog::new()
        .with_observatories([
            Observatory::new("BOU").with_location(40.1, -105.2),
            Observatory::new("BRW").with_location(71.3, -156.6),
            Observatory::new("HON").with_location(21.3, -158.0),
        ])
        .with_elements([Element::new("H"), Element::new("Z")]);
    let mut manager = SeriesManager::new(RecordingFetcher::default(), catalog);
    manager.update_config(
        ConfigUpdate::new()
            .elements(["Z", "H"])
            .observatories(["HON", "XXX", "BOU", "BRW"])
            .window(at(0, 0), at(1, 0)),
    );

    let keys: Vec<String> = manager.keys().map(ToString::to_string).collect();
    assert_eq!(
        keys,
        vec![
            "BRW_Z", "BRW_H", "BOU_Z", "BOU_H", "HON_Z", "HON_H", "XXX_Z", "XXX_H"
        ]
    );
}

#[test]
fn catalog_replacement_resorts_without_recreating() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["AAA", "BBB"])
            .window(at(0, 0), at(1, 0)),
    );
    let instances: Vec<(String, u64)> = manager
        .timeseries()
        .map(|series| (series.id().to_string(), series.instance()))
        .collect();
    manager.drain_events();

    manager.set_catalog(Catalog::new().with_observatories([
        Observatory::new("AAA").with_location(10.0, 0.0),
        Observatory::new("BBB").with_location(60.0, 0.0),
    ]));

    let resorted: Vec<(String, u64)> = manager
        .timeseries()
        .map(|series| (series.id().to_string(), series.instance()))
        .collect();
    assert_eq!(resorted, vec![instances[1].clone(), instances[0].clone()]);
    assert_eq!(
        manager
            .get(&key("BBB", "H"))
            .and_then(|series| series.observatory())
            .and_then(|observatory| observatory.latitude),
        Some(60.0)
    );
    assert_eq!(manager.drain_events().len(), 1);
    assert_eq!(log.borrow().issued.len(), 2);
}

#[test]
fn response_without_channels_yields_missing_samples() {
    let (mut manager, _log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let ticket = manager.pending_ticket_for(&key("BOU", "H")).expect("pending");
    let empty = FetchResponse {
        times: vec!["2024-03-01T00:00:00Z".to_owned(), "2024-03-01T00:01:00Z".to_owned()],
        values: Vec::new(),
    };
    manager.complete(ticket, Ok(empty));

    let series = manager.get(&key("BOU", "H")).expect("managed");
    assert_eq!(series.values(), &[None, None]);
    assert_eq!(series.get_gaps().len(), 1);
}

#[test]
fn undecodable_response_is_treated_as_failure() {
    let (mut manager, _log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H"])
            .observatories(["BOU"])
            .window(at(0, 0), at(1, 0)),
    );
    let ticket = manager.pending_ticket_for(&key("BOU", "H")).expect("pending");
    let mut bad = response(vec![Some(1.0)]);
    bad.times[0] = "yesterday".to_owned();
    manager.complete(ticket, Ok(bad));

    let series = manager.get(&key("BOU", "H")).expect("managed");
    assert!(series.has_error());
    assert!(series.is_empty());
}

#[test]
fn dropping_manager_aborts_pending_requests() {
    let (mut manager, log) = manager();
    manager.update_config(
        ConfigUpdate::new()
            .elements(["H", "Z"])
            .observatories(["BOU"])
            .window(at(0, 0), at(0, 0) + TimeDelta::hours(2)),
    );
    let pending: Vec<FetchTicket> = manager.pending_tickets().collect();
    drop(manager);

    assert_eq!(log.borrow().cancelled, pending);
}
