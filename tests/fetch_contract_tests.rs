use chrono::{TimeZone, Utc};
use geomag_chart::core::{SeriesId, SeriesKey, Timeseries, parse_observatories_geojson};
use geomag_chart::series::{
    FetchDescriptor, FetchFailure, FetchResponse, FetchTicket, RequestState, RequestWindow,
    SeriesFetcher, SeriesRequest,
};
use geomag_chart::ChartError;

#[derive(Debug, Default)]
struct Calls {
    fetched: Vec<FetchTicket>,
    cancelled: Vec<FetchTicket>,
}

impl SeriesFetcher for Calls {
    fn fetch(&mut self, ticket: FetchTicket, _descriptor: &FetchDescriptor) {
        self.fetched.push(ticket);
    }

    fn cancel(&mut self, ticket: FetchTicket) {
        self.cancelled.push(ticket);
    }
}

fn window() -> RequestWindow {
    RequestWindow {
        starttime: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().expect("start"),
        endtime: Utc.with_ymd_and_hms(2024, 1, 2, 23, 59, 59).single().expect("end"),
        sampling_period: 60,
        data_type: Some("variation".to_owned()),
    }
}

#[test]
fn descriptor_query_string_matches_service_parameters() {
    let request = SeriesRequest::new(FetchTicket(7), SeriesKey::new("BOU", "H"), window());
    let descriptor = request.descriptor();

    assert_eq!(
        descriptor.query_string(),
        "id=BOU&starttime=2024-01-02T00%3A00%3A00Z&endtime=2024-01-02T23%3A59%3A59Z\
         &elements=H&sampling_period=60&type=variation&format=json"
    );
}

#[test]
fn descriptor_query_pairs_join_elements() {
    let descriptor = FetchDescriptor {
        id: "FRD".to_owned(),
        elements: vec!["X".to_owned(), "Y".to_owned(), "Z".to_owned()],
        starttime: window().starttime,
        endtime: window().endtime,
        sampling_period: 1,
        data_type: None,
    };
    let pairs = descriptor.query_pairs();
    assert!(pairs.contains(&("elements", "X,Y,Z".to_owned())));
    assert!(pairs.iter().all(|(name, _)| *name != "type"));
    assert_eq!(pairs.last(), Some(&("format", "json".to_owned())));
}

#[test]
fn request_lifecycle_only_applies_while_active() {
    let mut calls = Calls::default();
    let mut request = SeriesRequest::new(FetchTicket(1), SeriesKey::new("BOU", "H"), window());
    let mut series = Timeseries::new(SeriesId::Pair(SeriesKey::new("BOU", "H")));
    assert_eq!(request.state(), RequestState::Created);
    assert!(!request.abort(&mut calls));

    request.start(&mut calls);
    assert!(request.is_active());
    assert!(request.abort(&mut calls));
    assert!(!request.abort(&mut calls));
    assert_eq!(calls.cancelled, vec![FetchTicket(1)]);

    let response = FetchResponse::from_json_str(
        r#"{"times": ["2024-01-02T00:00:00.000Z"], "values": [{"id": "H", "values": [1.5]}]}"#,
    )
    .expect("valid response");
    assert!(!request.complete(&mut series, Ok(response.clone())));
    assert!(series.is_empty());

    request.start(&mut calls);
    assert!(request.complete(&mut series, Ok(response.clone())));
    assert_eq!(request.state(), RequestState::Completed);
    assert_eq!(series.values(), &[Some(1.5)]);
    assert!(!request.complete(&mut series, Err(FetchFailure::status(500))));
    assert!(!series.has_error());
}

#[test]
fn restarting_an_active_request_cancels_the_previous_fetch() {
    let mut calls = Calls::default();
    let mut request = SeriesRequest::new(FetchTicket(3), SeriesKey::new("BOU", "Z"), window());
    request.start(&mut calls);
    request.start(&mut calls);
    assert_eq!(calls.fetched, vec![FetchTicket(3), FetchTicket(3)]);
    assert_eq!(calls.cancelled, vec![FetchTicket(3)]);
}

#[test]
fn response_converts_every_channel_to_a_series() {
    let response = FetchResponse::from_json_str(
        r#"{
            "times": ["2024-01-02T00:00:00Z", "2024-01-02T00:01:00Z"],
            "values": [
                {"id": "H", "metadata": {"station": "BOU", "element": "H"}, "values": [1.0, null]},
                {"id": "Z", "metadata": {"station": "BOU", "element": "Z"}, "values": [null, 2.0]}
            ]
        }"#,
    )
    .expect("valid response");

    let series = response.timeseries().expect("convertible");
    assert_eq!(series.len(), 2);
    assert!(matches!(series[0].id(), SeriesId::Sequence(_)));
    assert_ne!(series[0].id(), series[1].id());
    assert_eq!(series[0].metadata()["observatory"], "BOU");
    assert_eq!(series[1].metadata()["channel"], "Z");
    assert_eq!(series[1].values(), &[None, Some(2.0)]);
}

#[test]
fn failure_without_message_uses_default_text() {
    let failure = FetchFailure::status(502);
    assert_eq!(failure.display_message(), "Error fetching data");
    assert_eq!(
        ChartError::from(failure),
        ChartError::Fetch {
            status: Some(502),
            message: "Error fetching data".to_owned()
        }
    );
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = FetchResponse::from_json_str("{not json").expect_err("invalid json");
    assert!(matches!(err, ChartError::Parse(_)));
}

#[test]
fn observatory_geojson_accepts_numeric_and_string_coordinates() {
    let observatories = parse_observatories_geojson(
        r#"{
            "type": "FeatureCollection",
            "features": [
                {"properties": {"id": "BOU", "name": "Boulder", "latitude": 40.137, "longitude": "-105.237"}},
                {"properties": {"id": "SJG"}}
            ]
        }"#,
    )
    .expect("valid geojson");

    assert_eq!(observatories.len(), 2);
    assert_eq!(observatories[0].name.as_deref(), Some("Boulder"));
    assert!((observatories[0].latitude.expect("latitude") - 40.137).abs() <= 1e-9);
    assert!((observatories[0].longitude.expect("longitude") + 105.237).abs() <= 1e-9);
    assert_eq!(observatories[1].latitude, None);
}

#[test]
fn observatory_geojson_requires_ids() {
    let err = parse_observatories_geojson(r#"{"features": [{"properties": {"name": "x"}}]}"#)
        .expect_err("missing id");
    assert!(matches!(err, ChartError::Parse(_)));
}
