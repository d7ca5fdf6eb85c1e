/// Vertical bar charts: single series with a nice-step grid, and grouped
/// multi-series bars with a side legend.
use super::canvas::{Canvas2d, TextAlign};
use super::format::{format_abbr, nice_step};
use super::{Rect, color_at, theme};

/// Gridline count of the single-series chart.
const GRID_STEPS: usize = 5;
/// Widest bar the single-series chart draws.
const MAX_BAR_WIDTH: f64 = 80.0;

/// Y axis of a bar chart: `steps` gridlines of `step` each, up to `max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxis {
    pub steps: usize,
    pub step: f64,
    pub max: f64,
}

/// Compute the axis for a set of values.
///
/// The data maximum is floored to 1 so that empty and all-zero series still
/// produce a usable scale.
pub fn grid_axis(values: &[f64], steps: usize) -> GridAxis {
    let steps = steps.max(1);
    let max_val = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(1.0_f64, f64::max);
    let step = nice_step(max_val / steps as f64);
    GridAxis {
        steps,
        step,
        max: step * steps as f64,
    }
}

/// A horizontal gridline and its tick label.
#[derive(Debug, Clone, PartialEq)]
pub struct Gridline {
    pub y: f64,
    pub label: String,
}

/// One painted bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: f64,
    /// Baseline of the value annotation drawn above the bar.
    pub value_y: f64,
    pub color: String,
}

impl BarRect {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// Geometry of a single-series bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChartLayout {
    pub plot: Rect,
    pub axis: GridAxis,
    pub gridlines: Vec<Gridline>,
    /// `(label, center_x)` for every category.
    pub labels: Vec<(String, f64)>,
    pub bars: Vec<BarRect>,
}

/// Lay out a single-series bar chart in a `width x height` CSS box.
pub fn bar_chart_layout(
    width: f64,
    height: f64,
    labels: &[String],
    values: &[f64],
    colors: &[&str],
) -> BarChartLayout {
    let plot = Rect::inset(width, height, 56.0, 16.0, 24.0, 44.0);
    let axis = grid_axis(values, GRID_STEPS);

    let gridlines = (0..=axis.steps)
        .map(|i| {
            let frac = i as f64 / axis.steps as f64;
            Gridline {
                y: plot.bottom() - frac * plot.height,
                label: format_abbr(frac * axis.max),
            }
        })
        .collect();

    let mut out_labels = Vec::with_capacity(labels.len());
    let mut bars = Vec::with_capacity(labels.len());
    if !labels.is_empty() {
        let group_width = plot.width / labels.len() as f64;
        let bar_width = MAX_BAR_WIDTH.min(group_width * 0.5);
        for (i, label) in labels.iter().enumerate() {
            let center = plot.x + i as f64 * group_width + group_width / 2.0;
            let value = values.get(i).copied().filter(|v| v.is_finite()).unwrap_or(0.0);
            let h = value / axis.max * plot.height;
            let y = plot.bottom() - h;
            out_labels.push((label.clone(), center));
            bars.push(BarRect {
                x: center - bar_width / 2.0,
                y,
                width: bar_width,
                height: h,
                value,
                value_y: (plot.y + 12.0).max(y - 6.0),
                color: color_at(colors, i).to_string(),
            });
        }
    }

    BarChartLayout {
        plot,
        axis,
        gridlines,
        labels: out_labels,
        bars,
    }
}

/// Draw a single-series bar chart with gridlines and value annotations.
///
/// Colors are applied per bar, cycling through the palette.
pub fn draw_bar_chart_with_grid<C: Canvas2d + ?Sized>(
    ctx: &mut C,
    labels: &[String],
    values: &[f64],
    colors: &[&str],
) -> BarChartLayout {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    let layout = bar_chart_layout(w, h, labels, values, colors);

    ctx.set_stroke_style(theme::GRID);
    ctx.set_line_width(1.0);
    ctx.set_font_size(12.0);
    ctx.set_fill_style(theme::TICK_TEXT);
    ctx.set_text_align(TextAlign::Right);
    for line in &layout.gridlines {
        ctx.begin_path();
        ctx.move_to(layout.plot.x, line.y);
        ctx.line_to(layout.plot.right(), line.y);
        ctx.stroke();
        ctx.fill_text(&line.label, layout.plot.x - 8.0, line.y + 4.0);
    }

    ctx.set_text_align(TextAlign::Center);
    for ((label, center), bar) in layout.labels.iter().zip(&layout.bars) {
        ctx.set_fill_style(theme::LABEL_TEXT);
        ctx.fill_text(label, *center, h - 16.0);
        ctx.set_fill_style(&bar.color);
        ctx.fill_rect(bar.x, bar.y, bar.width, bar.height);
        ctx.set_fill_style(theme::VALUE_TEXT);
        ctx.fill_text(&format_abbr(bar.value), *center, bar.value_y);
    }

    layout
}

// ---------------------------------------------------------------------------
// Grouped bars
// ---------------------------------------------------------------------------

/// A named series of a grouped bar chart.
#[derive(Debug, Clone)]
pub struct Series<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub values: Vec<f64>,
}

/// A bar of a grouped chart, tagged with its group and series index.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedBar {
    pub group: usize,
    pub series: usize,
    pub rect: BarRect,
}

/// Geometry of a grouped bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedLayout {
    pub plot: Rect,
    /// Per-group normalisation maximum (floored to 1).
    pub group_max: Vec<f64>,
    pub labels: Vec<(String, f64)>,
    pub bars: Vec<GroupedBar>,
    /// Top-left of the legend column, right of the plot.
    pub legend_origin: (f64, f64),
}

/// Lay out a grouped bar chart.
///
/// Each group is normalised to its own maximum so that a large metric
/// (energy) does not flatten the others.
pub fn grouped_bar_layout(
    width: f64,
    height: f64,
    labels: &[String],
    series: &[Series<'_>],
) -> GroupedLayout {
    const BAR_GAP: f64 = 10.0;
    let plot = Rect::inset(width, height, 50.0, 140.0, 30.0, 48.0);
    let value = |s: &Series<'_>, g: usize| s.values.get(g).copied().filter(|v| v.is_finite()).unwrap_or(0.0);

    let group_max: Vec<f64> = (0..labels.len())
        .map(|g| series.iter().map(|s| value(s, g)).fold(1.0_f64, f64::max))
        .collect();

    let mut out_labels = Vec::with_capacity(labels.len());
    let mut bars = Vec::new();
    if !labels.is_empty() && !series.is_empty() {
        let inner = series.len() as f64;
        let group_width = plot.width / labels.len() as f64;
        let avail = group_width * 0.7;
        let bar_width = 42.0_f64.min((avail - (inner - 1.0) * BAR_GAP) / inner);
        let cluster = inner * bar_width + (inner - 1.0) * BAR_GAP;

        for (g, label) in labels.iter().enumerate() {
            out_labels.push((label.clone(), plot.x + g as f64 * group_width + group_width / 2.0));
            let base_x = plot.x + g as f64 * group_width + (group_width - cluster) / 2.0;
            for (b, s) in series.iter().enumerate() {
                let v = value(s, g);
                let h = v / group_max[g] * plot.height;
                let y = plot.bottom() - h;
                bars.push(GroupedBar {
                    group: g,
                    series: b,
                    rect: BarRect {
                        x: base_x + b as f64 * (bar_width + BAR_GAP),
                        y,
                        width: bar_width,
                        height: h,
                        value: v,
                        value_y: (plot.y + 12.0).max(y - 6.0),
                        color: s.color.to_string(),
                    },
                });
            }
        }
    }

    GroupedLayout {
        plot,
        group_max,
        labels: out_labels,
        bars,
        legend_origin: (plot.right() + 10.0, plot.y + 10.0),
    }
}

/// Draw a grouped bar chart with axes and a legend of series names.
pub fn draw_grouped_bar_chart<C: Canvas2d + ?Sized>(
    ctx: &mut C,
    labels: &[String],
    series: &[Series<'_>],
) -> GroupedLayout {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    let layout = grouped_bar_layout(w, h, labels, series);
    let plot = layout.plot;

    ctx.set_stroke_style(theme::AXIS);
    ctx.set_line_width(1.0);
    ctx.begin_path();
    ctx.move_to(plot.x, plot.bottom());
    ctx.line_to(plot.right(), plot.bottom());
    ctx.move_to(plot.x, plot.y);
    ctx.line_to(plot.x, plot.bottom());
    ctx.stroke();

    ctx.set_fill_style(theme::LABEL_TEXT);
    ctx.set_font_size(12.0);
    ctx.set_text_align(TextAlign::Center);
    for (label, x) in &layout.labels {
        ctx.fill_text(label, *x, plot.bottom() + 18.0);
    }

    for bar in &layout.bars {
        let r = &bar.rect;
        ctx.set_fill_style(&r.color);
        ctx.fill_rect(r.x, r.y, r.width, r.height);
        ctx.set_fill_style(theme::VALUE_TEXT);
        ctx.set_text_align(TextAlign::Center);
        ctx.fill_text(&format_abbr(r.value), r.center_x(), r.value_y);
    }

    let (lx, mut ly) = layout.legend_origin;
    for s in series {
        ctx.set_fill_style(s.color);
        ctx.fill_rect(lx, ly - 10.0, 14.0, 14.0);
        ctx.set_fill_style(theme::LABEL_TEXT);
        ctx.set_font_size(12.0);
        ctx.set_text_align(TextAlign::Left);
        ctx.fill_text(s.name, lx + 20.0, ly + 2.0);
        ly += 18.0;
    }

    layout
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::canvas::setup_canvas;
    use crate::charts::recording::RecordingCanvas;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn is_nice(step: f64) -> bool {
        let pow10 = 10f64.powi(step.log10().floor() as i32);
        let norm = step / pow10;
        [1.0, 2.0, 5.0, 10.0].iter().any(|c| (norm - c).abs() < 1e-9)
    }

    #[test]
    fn axis_is_nice_and_covers_data() {
        for max in [0.5, 1.0, 3.0, 34.0, 120.0, 999.0, 58_000.0, 1_234_567.0] {
            let axis = grid_axis(&[max / 2.0, max], 5);
            assert!(axis.max >= max, "axis {} < data {}", axis.max, max);
            assert!(is_nice(axis.step), "step {} not nice", axis.step);
            assert!((axis.max - axis.step * 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_and_zero_series_use_synthetic_max() {
        let empty = grid_axis(&[], 5);
        let zeros = grid_axis(&[0.0, 0.0], 5);
        assert_eq!(empty, zeros);
        assert_eq!(empty.max, 1.0);

        let layout = bar_chart_layout(600.0, 400.0, &[], &[], &["#fff"]);
        assert_eq!(layout.gridlines.len(), 6);
        assert!(layout.bars.is_empty());
    }

    #[test]
    fn bars_are_centered_and_capped() {
        let layout = bar_chart_layout(
            600.0,
            400.0,
            &labels(&["Cargas", "Usuarios"]),
            &[120.0, 34.0],
            &["#ff9800", "#4CAF50"],
        );
        let plot_w = 600.0 - 56.0 - 16.0;
        let group = plot_w / 2.0;
        assert_eq!(layout.bars[0].width, 80.0_f64.min(group * 0.5));
        assert!((layout.bars[0].center_x() - (56.0 + group / 2.0)).abs() < 1e-9);
        assert!((layout.bars[1].center_x() - (56.0 + group * 1.5)).abs() < 1e-9);
        assert_eq!(layout.bars[1].color, "#4CAF50");
    }

    #[test]
    fn value_label_stays_below_top_margin() {
        let layout = bar_chart_layout(400.0, 300.0, &labels(&["a"]), &[100.0], &["#000"]);
        let bar = &layout.bars[0];
        // 100 fills the full axis, so the label is clamped to top + 12.
        assert_eq!(layout.axis.max, 100.0);
        assert_eq!(bar.value_y, 24.0 + 12.0);
    }

    #[test]
    fn colors_cycle() {
        let layout = bar_chart_layout(
            900.0,
            400.0,
            &labels(&["a", "b", "c"]),
            &[1.0, 2.0, 3.0],
            &["red", "blue"],
        );
        let colors: Vec<&str> = layout.bars.iter().map(|b| b.color.as_str()).collect();
        assert_eq!(colors, ["red", "blue", "red"]);
    }

    #[test]
    fn draw_paints_gridlines_and_values() {
        let mut canvas = RecordingCanvas::default();
        setup_canvas(&mut canvas, 600.0, 380.0, 2.0);
        draw_bar_chart_with_grid(&mut canvas, &labels(&["Energía (Wh)"]), &[58_000.0], &["#03A9F4"]);
        let texts = canvas.texts();
        assert!(texts.contains(&"58K"));
        assert!(texts.contains(&"Energía (Wh)"));
        assert_eq!(canvas.rects().len(), 1);
    }

    #[test]
    fn grouped_bars_normalise_per_group() {
        let series = [
            Series {
                name: "Portobelo",
                color: "#ff9800",
                values: vec![10.0, 5.0, 50_000.0],
            },
            Series {
                name: "Salvio",
                color: "#03A9F4",
                values: vec![20.0, 5.0, 25_000.0],
            },
        ];
        let layout = grouped_bar_layout(
            800.0,
            360.0,
            &labels(&["Cargas", "Usuarios", "Energía (Wh)"]),
            &series,
        );
        assert_eq!(layout.group_max, vec![20.0, 5.0, 50_000.0]);
        assert_eq!(layout.bars.len(), 6);

        let full = layout.plot.height;
        let salvio_cargas = &layout.bars[1].rect;
        assert!((salvio_cargas.height - full).abs() < 1e-9);
        let porto_cargas = &layout.bars[0].rect;
        assert!((porto_cargas.height - full / 2.0).abs() < 1e-9);
        assert!(porto_cargas.width <= 42.0);
        // Second bar of a group sits one bar width + gap to the right.
        assert!((salvio_cargas.x - porto_cargas.x - porto_cargas.width - 10.0).abs() < 1e-9);
    }

    #[test]
    fn grouped_draw_includes_legend() {
        let mut canvas = RecordingCanvas::default();
        setup_canvas(&mut canvas, 800.0, 360.0, 1.0);
        let series = [
            Series {
                name: "Portobelo",
                color: "#ff9800",
                values: vec![1.0],
            },
            Series {
                name: "Salvio",
                color: "#03A9F4",
                values: vec![2.0],
            },
        ];
        draw_grouped_bar_chart(&mut canvas, &labels(&["Cargas"]), &series);
        let texts = canvas.texts();
        assert!(texts.contains(&"Portobelo"));
        assert!(texts.contains(&"Salvio"));
    }
}
