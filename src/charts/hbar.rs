/// Horizontal ranking bars with truncated labels and value pills.
use super::canvas::{Canvas2d, TextAlign, round_rect};
use super::format::{plain_number, truncate_label};
use super::theme;

const RIGHT: f64 = 24.0;
const TOP: f64 = 8.0;
const BOTTOM: f64 = 8.0;
/// Space kept free at the right end so bars never touch the edge.
const END_PAD: f64 = 28.0;
const PILL_W: f64 = 28.0;
const PILL_H: f64 = 16.0;

/// Placement of a value badge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pill {
    pub x: f64,
    pub y: f64,
    pub inside: bool,
}

/// One ranking row.
#[derive(Debug, Clone, PartialEq)]
pub struct HBarRow {
    pub label: String,
    pub value: f64,
    pub y: f64,
    pub height: f64,
    pub width: f64,
    pub pill: Pill,
}

/// Geometry of a horizontal bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct HBarLayout {
    pub left: f64,
    pub bar_max_width: f64,
    pub max_chars: usize,
    pub rows: Vec<HBarRow>,
}

/// Label character budget for a canvas width.
pub fn label_budget(width: f64) -> usize {
    if width < 380.0 {
        14
    } else if width < 480.0 {
        18
    } else {
        22
    }
}

/// Lay out ranking rows in a `width x height` CSS box.
pub fn hbar_layout(width: f64, height: f64, labels: &[String], values: &[f64]) -> HBarLayout {
    let left = (width * 0.22).floor().clamp(80.0, 140.0);
    let chart_w = width - left - RIGHT;
    let row_h = (height - TOP - BOTTOM) / labels.len().max(1) as f64;
    let bar_max_width = (chart_w - END_PAD).max(40.0);
    let max_val = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(1.0_f64, f64::max);
    let max_chars = label_budget(width);

    let rows = labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let value = values.get(i).copied().filter(|v| v.is_finite()).unwrap_or(0.0);
            let y = TOP + i as f64 * row_h + row_h * 0.2;
            let h = (row_h * 0.6).max(10.0);
            let w = (value / max_val * bar_max_width).min(bar_max_width).max(2.0);

            let pill_y = y + (h - PILL_H) / 2.0;
            let pill = if w >= PILL_W + 12.0 {
                Pill {
                    x: left + w - PILL_W - 6.0,
                    y: pill_y,
                    inside: true,
                }
            } else {
                Pill {
                    x: left + (bar_max_width - PILL_W).min(w + 6.0),
                    y: pill_y,
                    inside: false,
                }
            };

            HBarRow {
                label: truncate_label(label, max_chars),
                value,
                y,
                height: h,
                width: w,
                pill,
            }
        })
        .collect();

    HBarLayout {
        left,
        bar_max_width,
        max_chars,
        rows,
    }
}

/// Draw horizontal ranking bars in a single color.
pub fn draw_hbar<C: Canvas2d + ?Sized>(
    ctx: &mut C,
    labels: &[String],
    values: &[f64],
    color: &str,
) -> HBarLayout {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    let layout = hbar_layout(w, h, labels, values);

    for row in &layout.rows {
        ctx.set_font_size(12.0);
        ctx.set_text_align(TextAlign::Right);
        ctx.set_fill_style(theme::VALUE_TEXT);
        ctx.fill_text(&row.label, layout.left - 8.0, row.y + row.height - 2.0);

        ctx.set_fill_style(color);
        round_rect(ctx, layout.left, row.y, row.width, row.height, (row.height / 2.0).min(8.0));
        ctx.fill();

        ctx.set_fill_style(if row.pill.inside {
            "rgba(0,0,0,0.35)"
        } else {
            "rgba(0,0,0,0.25)"
        });
        round_rect(ctx, row.pill.x, row.pill.y, PILL_W, PILL_H, 8.0);
        ctx.fill();

        ctx.set_fill_style(color);
        ctx.set_text_align(TextAlign::Center);
        ctx.set_font_size(11.0);
        ctx.fill_text(
            &plain_number(row.value),
            row.pill.x + PILL_W / 2.0,
            row.pill.y + PILL_H - 4.0,
        );
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

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bar_widths_are_proportional() {
        let layout = hbar_layout(520.0, 220.0, &names(&["Ana", "Bo"]), &[10.0, 3.0]);
        let max = layout.bar_max_width;
        assert_eq!(layout.rows[0].width, max);
        assert!((layout.rows[1].width - max * 0.3).abs() < 1e-9);
    }

    #[test]
    fn left_margin_is_clamped() {
        assert_eq!(hbar_layout(320.0, 200.0, &[], &[]).left, 80.0);
        assert_eq!(hbar_layout(500.0, 200.0, &[], &[]).left, 110.0);
        assert_eq!(hbar_layout(920.0, 200.0, &[], &[]).left, 140.0);
    }

    #[test]
    fn label_budget_by_width() {
        assert_eq!(label_budget(320.0), 14);
        assert_eq!(label_budget(400.0), 18);
        assert_eq!(label_budget(600.0), 22);

        let layout = hbar_layout(320.0, 100.0, &names(&["Maximiliano Fernández"]), &[1.0]);
        assert_eq!(layout.rows[0].label, "Maximiliano…");
    }

    #[test]
    fn pill_moves_outside_short_bars() {
        let layout = hbar_layout(600.0, 200.0, &names(&["a", "b"]), &[100.0, 1.0]);
        let long = &layout.rows[0];
        assert!(long.pill.inside);
        assert!((long.pill.x - (layout.left + long.width - 34.0)).abs() < 1e-9);

        let short = &layout.rows[1];
        assert!(!short.pill.inside);
        assert!((short.pill.x - (layout.left + short.width + 6.0)).abs() < 1e-9);
    }

    #[test]
    fn bars_never_shorter_than_two_pixels() {
        let layout = hbar_layout(600.0, 200.0, &names(&["a", "b"]), &[1000.0, 0.0]);
        assert_eq!(layout.rows[1].width, 2.0);
    }

    #[test]
    fn draw_writes_labels_and_values() {
        let mut canvas = RecordingCanvas::default();
        setup_canvas(&mut canvas, 520.0, 220.0, 1.0);
        draw_hbar(&mut canvas, &names(&["Ana", "Bo"]), &[10.0, 3.0], "#ff9800");
        let texts = canvas.texts();
        assert_eq!(texts, ["Ana", "10", "Bo", "3"]);
    }
}
