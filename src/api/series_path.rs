use std::ops::Range;

use chrono::{DateTime, Utc};

use crate::core::{LinearScale, datetime_to_unix_millis};
use crate::error::ChartResult;

type Point = (f64, f64);

/// Line runs for the samples in `window`, clipped to a `frame_size` box.
///
/// Missing samples split the line. Points are frame-local; runs that clip to
/// a single point are dropped.
pub fn series_polylines(
    times: &[DateTime<Utc>],
    values: &[Option<f64>],
    window: Range<usize>,
    x_scale: LinearScale,
    y_scale: LinearScale,
    frame_size: (f64, f64),
) -> ChartResult<Vec<Vec<Point>>> {
    let end = window.end.min(times.len()).min(values.len());
    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut run: Vec<Point> = Vec::new();

    for index in window.start.min(end)..end {
        match values[index] {
            Some(value) => {
                let x = x_scale.map(datetime_to_unix_millis(times[index]))?;
                let y = y_scale.map(value)?;
                run.push((x, y));
            }
            None => flush_run(&mut run, &mut runs, frame_size),
        }
    }
    flush_run(&mut run, &mut runs, frame_size);
    Ok(runs)
}

fn flush_run(run: &mut Vec<Point>, runs: &mut Vec<Vec<Point>>, frame_size: (f64, f64)) {
    let points = std::mem::take(run);
    let mut current: Vec<Point> = Vec::new();
    let mut connected = false;

    for pair in points.windows(2) {
        let Some(clipped) = clip_segment(pair[0], pair[1], frame_size) else {
            push_polyline(&mut current, runs);
            connected = false;
            continue;
        };
        if !(connected && !clipped.start_clipped) {
            push_polyline(&mut current, runs);
            current.push(clipped.start);
        }
        current.push(clipped.end);
        connected = !clipped.end_clipped;
    }
    push_polyline(&mut current, runs);
}

fn push_polyline(current: &mut Vec<Point>, runs: &mut Vec<Vec<Point>>) {
    if current.len() >= 2 {
        runs.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ClippedSegment {
    start: Point,
    end: Point,
    start_clipped: bool,
    end_clipped: bool,
}

/// Liang-Barsky clip of a segment against `[0, width] x [0, height]`.
fn clip_segment(from: Point, to: Point, (width, height): (f64, f64)) -> Option<ClippedSegment> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let mut t_enter: f64 = 0.0;
    let mut t_exit: f64 = 1.0;

    for (p, q) in [
        (-dx, from.0),
        (dx, width - from.0),
        (-dy, from.1),
        (dy, height - from.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let ratio = q / p;
        if p < 0.0 {
            if ratio > t_exit {
                return None;
            }
            t_enter = t_enter.max(ratio);
        } else {
            if ratio < t_enter {
                return None;
            }
            t_exit = t_exit.min(ratio);
        }
    }

    Some(ClippedSegment {
        start: (from.0 + t_enter * dx, from.1 + t_enter * dy),
        end: (from.0 + t_exit * dx, from.1 + t_exit * dy),
        start_clipped: t_enter > 0.0,
        end_clipped: t_exit < 1.0,
    })
}
