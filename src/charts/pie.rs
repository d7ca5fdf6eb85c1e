/// Pie and donut charts.
use std::f64::consts::{FRAC_PI_2, TAU};

use super::canvas::{Canvas2d, TextAlign};
use super::format::plain_number;
use super::{color_at, theme};

/// A pie slice: start angle and clockwise sweep, in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub start: f64,
    pub sweep: f64,
}

/// Slices for a value vector, starting at the top (-90°) and running
/// clockwise in input order.
///
/// A zero total uses a denominator of 1, which yields empty slices.
pub fn pie_slices(values: &[f64]) -> Vec<Slice> {
    let sum: f64 = values.iter().copied().filter(|v| v.is_finite()).sum();
    let total = if sum == 0.0 { 1.0 } else { sum };
    let mut start = -FRAC_PI_2;
    values
        .iter()
        .map(|&v| {
            let v = if v.is_finite() { v } else { 0.0 };
            let sweep = v / total * TAU;
            let slice = Slice { start, sweep };
            start += sweep;
            slice
        })
        .collect()
}

/// Spacing of the legend row under a pie.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegendStyle {
    pub box_size: f64,
    /// Gap between the color box and the text.
    pub gap: f64,
    /// Gap after each item.
    pub item_gap: f64,
    /// Distance of the legend baseline from the bottom edge.
    pub bottom_offset: f64,
    /// Append `(NN%)` to each item.
    pub show_percent: bool,
}

impl LegendStyle {
    /// Station dashboard legend: `EV: 20`.
    pub const COMPACT: Self = Self {
        box_size: 12.0,
        gap: 8.0,
        item_gap: 16.0,
        bottom_offset: 16.0,
        show_percent: false,
    };

    /// Comparatives legend: `EV: 20 (59%)`.
    pub const DETAILED: Self = Self {
        box_size: 12.0,
        gap: 10.0,
        item_gap: 18.0,
        bottom_offset: 18.0,
        show_percent: true,
    };
}

/// A laid-out legend entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendItem {
    pub text: String,
    pub color: String,
    pub x: f64,
}

/// Geometry of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieLayout {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
    pub slices: Vec<Slice>,
    pub legend_y: f64,
    pub legend: Vec<LegendItem>,
}

/// Lay out a pie with its legend. `measure` returns the advance width of
/// legend text at 12px.
pub fn pie_layout(
    width: f64,
    height: f64,
    values: &[f64],
    colors: &[&str],
    labels: &[&str],
    style: LegendStyle,
    measure: impl Fn(&str) -> f64,
) -> PieLayout {
    let sum: f64 = values.iter().copied().filter(|v| v.is_finite()).sum();
    let total = if sum == 0.0 { 1.0 } else { sum };

    let entries: Vec<(String, String)> = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let v = values.get(i).copied().unwrap_or(0.0);
            let text = if style.show_percent {
                format!("{label}: {} ({}%)", plain_number(v), (v / total * 100.0).round())
            } else {
                format!("{label}: {}", plain_number(v))
            };
            (text, color_at(colors, i).to_string())
        })
        .collect();

    let advance = |text: &str| style.box_size + style.gap + measure(text) + style.item_gap;
    let total_width: f64 = entries.iter().map(|(t, _)| advance(t)).sum();
    let mut x = ((width - total_width) / 2.0).max(10.0);
    let legend = entries
        .into_iter()
        .map(|(text, color)| {
            let item = LegendItem {
                x,
                color,
                text: text.clone(),
            };
            x += advance(&text);
            item
        })
        .collect();

    PieLayout {
        cx: width / 2.0,
        cy: height / 2.0 - 10.0,
        radius: width.min(height) / 3.0,
        slices: pie_slices(values),
        legend_y: height - style.bottom_offset,
        legend,
    }
}

/// Draw a pie chart with a centred legend below it.
pub fn draw_pie_chart<C: Canvas2d + ?Sized>(
    ctx: &mut C,
    values: &[f64],
    colors: &[&str],
    labels: &[&str],
    style: LegendStyle,
) -> PieLayout {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    ctx.set_font_size(12.0);
    let layout = {
        let measure = |t: &str| ctx.measure_text(t);
        pie_layout(w, h, values, colors, labels, style, measure)
    };

    for (i, slice) in layout.slices.iter().enumerate() {
        ctx.begin_path();
        ctx.move_to(layout.cx, layout.cy);
        ctx.arc(
            layout.cx,
            layout.cy,
            layout.radius,
            slice.start,
            slice.start + slice.sweep,
        );
        ctx.close_path();
        ctx.set_fill_style(color_at(colors, i));
        ctx.fill();
    }

    ctx.set_text_align(TextAlign::Left);
    for item in &layout.legend {
        ctx.set_fill_style(&item.color);
        ctx.fill_rect(item.x, layout.legend_y - 10.0, style.box_size, style.box_size);
        ctx.set_fill_style(theme::LABEL_TEXT);
        ctx.fill_text(&item.text, item.x + style.box_size + style.gap, layout.legend_y);
    }

    layout
}

// ---------------------------------------------------------------------------
// Donut
// ---------------------------------------------------------------------------

const DONUT_RING: f64 = 22.0;

/// Covered fraction of a donut: `clamp(value / total, 0, 1)`, 0 when the
/// total is not positive.
pub fn donut_fraction(value: f64, total: f64) -> f64 {
    if total > 0.0 && value.is_finite() {
        (value / total).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Draw a donut showing `value / total` coverage with a centred percentage
/// caption (`"{pct}% {caption}"`). Returns the covered fraction.
pub fn draw_donut<C: Canvas2d + ?Sized>(ctx: &mut C, value: f64, total: f64, caption: &str) -> f64 {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let r = w.min(h) / 3.0;
    let pct = donut_fraction(value, total);

    ctx.begin_path();
    ctx.arc(cx, cy, r, 0.0, TAU);
    ctx.set_stroke_style(theme::GRID);
    ctx.set_line_width(DONUT_RING);
    ctx.stroke();

    ctx.begin_path();
    ctx.arc(cx, cy, r, -FRAC_PI_2, -FRAC_PI_2 + TAU * pct);
    ctx.set_stroke_style(theme::DONUT);
    ctx.set_line_width(DONUT_RING);
    ctx.stroke();

    ctx.set_font_size(16.0);
    ctx.set_fill_style(theme::VALUE_TEXT);
    ctx.set_text_align(TextAlign::Center);
    ctx.fill_text(&format!("{}% {caption}", (pct * 100.0).round()), cx, cy + 6.0);

    pct
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::canvas::setup_canvas;
    use crate::charts::recording::RecordingCanvas;

    #[test]
    fn slices_sum_to_full_turn() {
        for values in [vec![20.0, 14.0], vec![1.0, 2.0, 3.0, 4.0], vec![0.5, 1e6]] {
            let slices = pie_slices(&values);
            let total: f64 = values.iter().sum();
            let sum: f64 = slices.iter().map(|s| s.sweep).sum();
            assert!((sum - TAU).abs() < 1e-9);
            for (s, v) in slices.iter().zip(&values) {
                assert!((s.sweep - TAU * v / total).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn slices_start_at_top_and_chain() {
        let slices = pie_slices(&[1.0, 1.0]);
        assert_eq!(slices[0].start, -FRAC_PI_2);
        assert!((slices[1].start - (slices[0].start + slices[0].sweep)).abs() < 1e-12);
    }

    #[test]
    fn zero_total_gives_empty_slices() {
        let slices = pie_slices(&[0.0, 0.0]);
        assert!(slices.iter().all(|s| s.sweep == 0.0));
    }

    #[test]
    fn legend_is_centred_with_percentages() {
        let layout = pie_layout(
            400.0,
            300.0,
            &[20.0, 14.0],
            &["#03A9F4", "#8BC34A"],
            &["EV", "PHEV"],
            LegendStyle::DETAILED,
            |t| t.len() as f64 * 6.0,
        );
        assert_eq!(layout.legend[0].text, "EV: 20 (59%)");
        assert_eq!(layout.legend[1].text, "PHEV: 14 (41%)");
        let item = |t: &str| 12.0 + 10.0 + t.len() as f64 * 6.0 + 18.0;
        let total = item("EV: 20 (59%)") + item("PHEV: 14 (41%)");
        assert!((layout.legend[0].x - (400.0 - total) / 2.0).abs() < 1e-9);
        assert!((layout.legend[1].x - layout.legend[0].x - item("EV: 20 (59%)")).abs() < 1e-9);
        assert_eq!(layout.legend_y, 282.0);
    }

    #[test]
    fn compact_legend_has_no_percent() {
        let layout = pie_layout(
            400.0,
            300.0,
            &[3.0],
            &["#fff"],
            &["EV"],
            LegendStyle::COMPACT,
            |_| 10.0,
        );
        assert_eq!(layout.legend[0].text, "EV: 3");
        assert_eq!(layout.legend_y, 284.0);
    }

    #[test]
    fn legend_never_starts_left_of_margin() {
        let layout = pie_layout(
            100.0,
            300.0,
            &[1.0, 1.0],
            &["a", "b"],
            &["a very long label", "another very long label"],
            LegendStyle::DETAILED,
            |t| t.len() as f64 * 7.0,
        );
        assert_eq!(layout.legend[0].x, 10.0);
    }

    #[test]
    fn donut_fraction_clamps() {
        assert_eq!(donut_fraction(5.0, 10.0), 0.5);
        assert_eq!(donut_fraction(15.0, 10.0), 1.0);
        assert_eq!(donut_fraction(-1.0, 10.0), 0.0);
        assert_eq!(donut_fraction(3.0, 0.0), 0.0);
    }

    #[test]
    fn draw_donut_paints_ring_and_caption() {
        let mut canvas = RecordingCanvas::default();
        setup_canvas(&mut canvas, 300.0, 240.0, 1.0);
        let pct = draw_donut(&mut canvas, 3.0, 4.0, "recurrentes");
        assert_eq!(pct, 0.75);
        let arcs = canvas.arcs();
        assert_eq!(arcs.len(), 2);
        assert!((arcs[0].1 - TAU).abs() < 1e-12);
        assert!((arcs[1].1 - (-FRAC_PI_2 + TAU * 0.75)).abs() < 1e-12);
        assert_eq!(canvas.texts(), ["75% recurrentes"]);
    }
}
