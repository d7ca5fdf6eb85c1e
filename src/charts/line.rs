/// Line chart with a rounded y grid and a highlighted marker point.
///
/// Used for the sustainability sensitivity sweeps, where the marker shows
/// where the current assumption sits on the curve.
use std::f64::consts::TAU;

use super::canvas::{Canvas2d, TextAlign};
use super::format::{format_abbr, nice_step};
use super::{Rect, theme};

const GRID_STEPS: f64 = 5.0;
/// Target number of x tick labels.
const MAX_X_LABELS: usize = 6;
const MARKER_RADIUS: f64 = 4.0;

/// Geometry of a line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub plot: Rect,
    pub axis_min: f64,
    pub axis_max: f64,
    pub step: f64,
    /// `(y, label)` per gridline, bottom to top.
    pub gridlines: Vec<(f64, String)>,
    /// `(x, index)` of every labelled x tick.
    pub x_ticks: Vec<(f64, usize)>,
    pub points: Vec<(f64, f64)>,
    /// Index and position of the point closest to the marker value.
    pub marker: Option<(usize, f64, f64)>,
}

/// Index of the first x closest to `target`.
pub fn closest_index(xs: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &x) in xs.iter().enumerate() {
        let d = (x - target).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Lay out a line chart for parallel `xs` / `ys`.
pub fn line_layout(width: f64, height: f64, xs: &[f64], ys: &[f64], mark_x: Option<f64>) -> LineLayout {
    let plot = Rect::inset(width, height, 56.0, 16.0, 24.0, 44.0);
    let finite = || ys.iter().copied().filter(|v| v.is_finite());
    let y_min = finite().fold(0.0_f64, f64::min);
    let y_max = finite().fold(1.0_f64, f64::max);
    let y_range = match y_max - y_min {
        r if r == 0.0 => 1.0,
        r => r,
    };
    let step = nice_step(y_range / GRID_STEPS);
    let axis_max = (y_max / step).ceil() * step;
    let axis_min = (y_min / step).floor() * step;
    let axis_range = match axis_max - axis_min {
        r if r == 0.0 => step,
        r => r,
    };

    let y_of = |v: f64| plot.bottom() - (v - axis_min) / axis_range * plot.height;
    let lines = ((axis_max - axis_min) / step).round() as usize;
    let gridlines = (0..=lines)
        .map(|k| {
            let v = axis_min + k as f64 * step;
            (y_of(v), format_abbr(v))
        })
        .collect();

    let n = xs.len().min(ys.len());
    let denom = if n > 1 { (n - 1) as f64 } else { 1.0 };
    let x_of = |i: usize| plot.x + i as f64 / denom * plot.width;

    let every = (n / MAX_X_LABELS).max(1);
    let x_ticks = (0..n)
        .filter(|&i| i % every == 0 || i + 1 == n)
        .map(|i| (x_of(i), i))
        .collect();

    let points: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let y = if ys[i].is_finite() { ys[i] } else { 0.0 };
            (x_of(i), y_of(y))
        })
        .collect();

    let marker = mark_x
        .and_then(|m| closest_index(&xs[..n], m))
        .map(|i| (i, points[i].0, points[i].1));

    LineLayout {
        plot,
        axis_min,
        axis_max,
        step,
        gridlines,
        x_ticks,
        points,
        marker,
    }
}

/// Draw a line chart with gridlines, downsampled x labels, and a filled dot
/// at the point closest to `mark_x`.
pub fn draw_line_chart_with_grid<C: Canvas2d + ?Sized>(
    ctx: &mut C,
    xs: &[f64],
    ys: &[f64],
    color: &str,
    mark_x: Option<f64>,
    format_x: impl Fn(f64) -> String,
) -> LineLayout {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    let layout = line_layout(w, h, xs, ys, mark_x);
    let plot = layout.plot;

    ctx.set_stroke_style(theme::GRID);
    ctx.set_line_width(1.0);
    ctx.set_font_size(12.0);
    ctx.set_fill_style(theme::TICK_TEXT);
    ctx.set_text_align(TextAlign::Right);
    for (y, label) in &layout.gridlines {
        ctx.begin_path();
        ctx.move_to(plot.x, *y);
        ctx.line_to(plot.right(), *y);
        ctx.stroke();
        ctx.fill_text(label, plot.x - 8.0, y + 4.0);
    }

    ctx.set_text_align(TextAlign::Center);
    ctx.set_fill_style(theme::LABEL_TEXT);
    for &(x, i) in &layout.x_ticks {
        ctx.fill_text(&format_x(xs[i]), x, h - 16.0);
    }

    if !layout.points.is_empty() {
        ctx.set_stroke_style(color);
        ctx.set_line_width(2.0);
        ctx.begin_path();
        for (i, &(x, y)) in layout.points.iter().enumerate() {
            if i == 0 {
                ctx.move_to(x, y);
            } else {
                ctx.line_to(x, y);
            }
        }
        ctx.stroke();
    }

    if let Some((_, x, y)) = layout.marker {
        ctx.set_fill_style(color);
        ctx.begin_path();
        ctx.arc(x, y, MARKER_RADIUS, 0.0, TAU);
        ctx.fill();
    }

    layout
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
