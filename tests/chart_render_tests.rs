use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use geomag_chart::api::{ChartConfig, Hover, TimeseriesChart};
use geomag_chart::core::{SeriesId, SeriesKey, Timeseries};
use geomag_chart::interaction::{PlotStateUpdate, SharedPlotState};
use geomag_chart::render::NullRenderer;

// Default config: plot frame origin (100, 50), size 855 x 375.
const ORIGIN_X: f64 = 100.0;
const ORIGIN_Y: f64 = 50.0;
const FRAME_WIDTH: f64 = 855.0;

fn minutes(count: i64) -> Vec<DateTime<Utc>> {
    (0..count)
        .map(|i| Utc.timestamp_opt(1_700_000_000 + i * 60, 0).single().expect("valid time"))
        .collect()
}

/// Ten samples `0, 10, ..., 90` with indices 4 and 5 missing.
fn gappy_series() -> Timeseries {
    let values = (0..10)
        .map(|i| (i != 4 && i != 5).then_some(f64::from(i) * 10.0))
        .collect();
    Timeseries::from_samples(SeriesId::Pair(SeriesKey::new("BOU", "H")), minutes(10), values)
        .expect("valid samples")
}

fn chart(shared: &SharedPlotState) -> TimeseriesChart<NullRenderer> {
    TimeseriesChart::new(NullRenderer::default(), ChartConfig::default(), shared.clone())
        .expect("chart init")
}

fn hover_at(shared: &SharedPlotState, time: DateTime<Utc>) {
    shared
        .update(PlotStateUpdate::tooltip_x(Some(time)))
        .expect("update should apply");
}

#[test]
fn frame_contains_gap_rect_split_line_and_axes() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = gappy_series();

    chart.render(&series).expect("render");
    let frame = chart.renderer().last_frame().expect("frame rendered");

    // Plot background plus one gap.
    assert_eq!(frame.rects.len(), 2);
    assert_eq!(frame.polylines.len(), 2);
    assert_eq!(frame.polylines[0].points.len(), 4);
    assert_eq!(frame.polylines[1].points.len(), 4);
    assert!(frame.circles.is_empty());
    assert!(frame.overlay_rects.is_empty());

    assert_eq!(frame.texts_matching("90.0 nT").count(), 1);
    assert_eq!(frame.texts_matching("(90.0 nT)").count(), 1);
    assert_eq!(frame.texts_matching("0.0 nT").count(), 1);
}

#[test]
fn gap_rect_spans_neighbouring_samples() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    chart.render(&gappy_series()).expect("render");

    let frame = chart.renderer().last_frame().expect("frame rendered");
    let gap = &frame.rects[1];
    let step = FRAME_WIDTH / 9.0;
    assert!((gap.x - (ORIGIN_X + 3.0 * step)).abs() <= 1e-9);
    assert!((gap.width - 3.0 * step).abs() <= 1e-9);

    let layout = chart.layout().expect("layout computed");
    assert_eq!(layout.gaps.gaps().len(), 1);
    assert_eq!(layout.gaps.gaps()[0].gap.start_index, 4);
}

#[test]
fn hovering_a_sample_shows_marker_and_value() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = gappy_series();
    hover_at(&shared, series.times()[2]);

    chart.render(&series).expect("render");
    assert!(matches!(chart.hover(&series), Some(Hover::Sample { index: 2, .. })));

    let frame = chart.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.circles.len(), 1);
    assert_eq!(frame.overlay_rects.len(), 1);
    assert_eq!(frame.texts_matching("20 nT").count(), 1);
}

#[test]
fn pointer_at_left_edge_hovers_the_first_sample_on_every_chart() {
    let shared = SharedPlotState::new();
    let mut first = chart(&shared);
    let mut second = chart(&shared);
    let series = gappy_series();

    first
        .pointer_move(&series, ORIGIN_X, ORIGIN_Y + 100.0)
        .expect("pointer move");
    assert_eq!(shared.get().tooltip_x, Some(series.times()[0]));
    assert!(matches!(first.hover(&series), Some(Hover::Sample { index: 0, .. })));

    assert!(second.sync(&series).expect("sync"));
    match second.hover(&series) {
        Some(Hover::Sample { index, time, value }) => {
            assert_eq!(index, 0);
            assert_eq!(time, series.times()[0]);
            assert!(value.abs() <= 1e-9);
        }
        other => panic!("expected first sample hover, got {other:?}"),
    }
    let frame = second.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.texts_matching("0 nT").count(), 1);
    assert_eq!(frame.texts_matching("10 nT").count(), 0);
}

#[test]
fn single_sample_series_can_be_hovered() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = Timeseries::from_samples(
        SeriesId::Pair(SeriesKey::new("BOU", "H")),
        minutes(1),
        vec![Some(42.0)],
    )
    .expect("valid samples");
    hover_at(&shared, series.times()[0]);

    chart.render(&series).expect("render");
    assert!(matches!(chart.hover(&series), Some(Hover::Sample { index: 0, .. })));
    let frame = chart.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.circles.len(), 1);
    assert_eq!(frame.texts_matching("42 nT").count(), 1);
}

#[test]
fn hovering_a_missing_sample_shows_no_data() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = gappy_series();
    hover_at(&shared, series.times()[5]);

    chart.render(&series).expect("render");
    match chart.hover(&series) {
        Some(Hover::Gap { index, gap, .. }) => {
            assert_eq!(index, 5);
            assert_eq!((gap.start_index, gap.end_index), (4, 5));
        }
        other => panic!("expected gap hover, got {other:?}"),
    }

    let frame = chart.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.texts_matching("NO DATA").count(), 1);
}

#[test]
fn hovering_past_the_data_hides_tooltip() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = gappy_series();
    hover_at(&shared, series.times()[9] + TimeDelta::minutes(1));

    chart.render(&series).expect("render");
    assert!(chart.hover(&series).is_none());
    let frame = chart.renderer().last_frame().expect("frame rendered");
    assert!(frame.circles.is_empty());
    assert!(frame.overlay_rects.is_empty());
}

#[test]
fn pointer_move_on_one_chart_updates_the_other() {
    let shared = SharedPlotState::new();
    let mut first = chart(&shared);
    let mut second = chart(&shared);
    let series = gappy_series();

    let step = FRAME_WIDTH / 9.0;
    let rendered = first
        .pointer_move(&series, ORIGIN_X + 3.0 * step + 1.0, ORIGIN_Y + 100.0)
        .expect("pointer move");
    assert!(rendered);
    assert_eq!(shared.get().tooltip_x, Some(series.times()[3]));

    assert!(second.sync(&series).expect("sync"));
    let frame = second.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.texts_matching("30 nT").count(), 1);

    assert!(!second.sync(&series).expect("sync"));
    assert_eq!(second.renderer().render_count, 1);
}

#[test]
fn pointer_outside_frame_clears_tooltip() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = gappy_series();
    hover_at(&shared, series.times()[1]);

    chart.pointer_move(&series, 10.0, 10.0).expect("pointer move");
    assert_eq!(shared.get().tooltip_x, None);
}

#[test]
fn wheel_and_pan_update_shared_zoom() {
    let shared = SharedPlotState::new();
    let mut first = chart(&shared);
    let mut second = chart(&shared);
    let series = gappy_series();

    first
        .wheel(&series, ORIGIN_X + FRAME_WIDTH / 2.0, -500.0)
        .expect("wheel");
    let zoom = shared.get().zoom;
    assert!((zoom.scale - 2.0).abs() <= 1e-9);
    assert!((zoom.translate.0 - -FRAME_WIDTH / 2.0).abs() <= 1e-9);

    assert!(second.sync(&series).expect("sync"));
    let (start, end) = second.x_extent().expect("layout computed");
    assert!((end - start - 270_000.0).abs() <= 1e-6);

    assert!(!first.pan_move(&series, 600.0).expect("pan move"));
    first.pan_start(500.0);
    first.pan_move(&series, 600.0).expect("pan move");
    first.pan_end();
    let panned = shared.get().zoom;
    assert!((panned.translate.0 - (-FRAME_WIDTH / 2.0 + 100.0)).abs() <= 1e-9);
}

#[test]
fn fixed_y_extent_is_centred_on_visible_mean() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = gappy_series();
    shared
        .update(PlotStateUpdate::y_extent_size(Some(1000.0)))
        .expect("update should apply");

    chart.render(&series).expect("render");
    let (low, high) = chart.y_extent().expect("layout computed");
    assert!((low - -455.0).abs() <= 1e-9);
    assert!((high - 545.0).abs() <= 1e-9);
}

#[test]
fn empty_series_renders_only_the_frame() {
    let shared = SharedPlotState::new();
    let mut chart = chart(&shared);
    let series = Timeseries::new(SeriesId::Pair(SeriesKey::new("BOU", "H")));

    chart.render(&series).expect("render");
    assert!(chart.layout().is_none());
    let frame = chart.renderer().last_frame().expect("frame rendered");
    assert_eq!(frame.rects.len(), 1);
    assert!(frame.polylines.is_empty());
}

#[test]
fn dropping_a_chart_unsubscribes_it() {
    let shared = SharedPlotState::new();
    let first = chart(&shared);
    let second = chart(&shared);
    assert_eq!(shared.subscriber_count(), 2);

    drop(first);
    assert_eq!(shared.subscriber_count(), 1);
    drop(second);
    assert_eq!(shared.subscriber_count(), 0);
}
