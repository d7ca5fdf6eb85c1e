/// Hour-of-day heat strip.
use super::canvas::{Canvas2d, TextAlign};
use super::theme;

pub const HOURS: usize = 24;
const GAP: f64 = 2.0;
const PAD: f64 = 10.0;
/// Hours that get a tick label under the strip.
pub const TICK_HOURS: [usize; 5] = [0, 6, 12, 18, 23];

/// One hour cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatCell {
    pub hour: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Fill opacity, `0.15 + 0.75 * count / max`.
    pub opacity: f64,
}

/// Lay out 24 cells for a histogram.
///
/// Missing hours count as zero and extra entries are ignored. The maximum
/// is floored to 1, so an all-zero histogram renders every cell at 0.15.
pub fn heat_cells(width: f64, height: f64, histogram: &[f64]) -> Vec<HeatCell> {
    let count = |i: usize| {
        histogram
            .get(i)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    };
    let max = (0..HOURS).map(count).fold(1.0_f64, f64::max);
    let cell_w = (width - PAD * 2.0 - GAP * (HOURS - 1) as f64) / HOURS as f64;
    let cell_h = height - PAD * 2.0 - 10.0;

    (0..HOURS)
        .map(|hour| HeatCell {
            hour,
            x: PAD + hour as f64 * (cell_w + GAP),
            y: PAD,
            width: cell_w,
            height: cell_h,
            opacity: 0.15 + 0.75 * (count(hour) / max),
        })
        .collect()
}

/// Draw the strip with its hour ticks.
pub fn draw_heat_strip<C: Canvas2d + ?Sized>(ctx: &mut C, histogram: &[f64]) -> Vec<HeatCell> {
    let (w, h) = ctx.css_size();
    ctx.clear_rect(0.0, 0.0, w, h);
    let cells = heat_cells(w, h, histogram);

    for cell in &cells {
        ctx.set_fill_style(&theme::heat_fill(cell.opacity));
        ctx.fill_rect(cell.x, cell.y, cell.width, cell.height);
    }

    ctx.set_fill_style(theme::TICK_MUTED);
    ctx.set_font_size(10.0);
    ctx.set_text_align(TextAlign::Center);
    for hour in TICK_HOURS {
        let cell = &cells[hour];
        ctx.fill_text(&hour.to_string(), cell.x + cell.width / 2.0, h - 2.0);
    }

    cells
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
    fn all_zero_histogram_is_uniform() {
        let cells = heat_cells(600.0, 140.0, &[0.0; 24]);
        assert_eq!(cells.len(), 24);
        assert!(cells.iter().all(|c| (c.opacity - 0.15).abs() < 1e-12));
    }

    #[test]
    fn opacity_scales_linearly() {
        let mut hist = [0.0; 24];
        hist[18] = 10.0;
        hist[9] = 5.0;
        let cells = heat_cells(600.0, 140.0, &hist);
        assert!((cells[18].opacity - 0.90).abs() < 1e-12);
        assert!((cells[9].opacity - 0.525).abs() < 1e-12);
        assert!((cells[0].opacity - 0.15).abs() < 1e-12);
    }

    #[test]
    fn short_histogram_is_padded() {
        let cells = heat_cells(600.0, 140.0, &[4.0]);
        assert_eq!(cells.len(), 24);
        assert!((cells[0].opacity - 0.9).abs() < 1e-12);
        assert!((cells[23].opacity - 0.15).abs() < 1e-12);
    }

    #[test]
    fn cells_fill_the_width() {
        let cells = heat_cells(600.0, 140.0, &[1.0; 24]);
        let last = cells[23];
        assert!((last.x + last.width - (600.0 - 10.0)).abs() < 1e-9);
        assert_eq!(last.height, 100.0);
    }

    #[test]
    fn draw_labels_fixed_ticks() {
        let mut canvas = RecordingCanvas::default();
        setup_canvas(&mut canvas, 600.0, 140.0, 1.0);
        draw_heat_strip(&mut canvas, &[0.0; 24]);
        assert_eq!(canvas.texts(), ["0", "6", "12", "18", "23"]);
        assert_eq!(canvas.rects().len(), 24);
    }
}
