/// Canvas chart renderers.
///
/// Each renderer takes pre-aggregated series plus labels and colors and
/// paints onto a [`Canvas2d`], computing its own axis scaling, tick steps,
/// and legend layout. Every renderer has a pure `*_layout` counterpart that
/// returns the geometry without drawing, so the maths can be checked
/// independently of any backend.
///
/// - [`bars`]: single-series bars with a nice-step grid, grouped bars
/// - [`hbar`]: horizontal ranking bars
/// - [`pie`]: pie with legend, donut
/// - [`heat`]: 24-hour heat strip
/// - [`line`]: line chart with a marker, used for sensitivity sweeps
pub mod bars;
pub mod canvas;
pub mod format;
pub mod heat;
pub mod hbar;
pub mod line;
pub mod pie;
pub mod recording;
pub mod svg;

pub use canvas::{Canvas2d, CanvasGeometry, TextAlign, setup_canvas};
pub use svg::SvgCanvas;

/// Plot area inside a canvas, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// The area left after removing margins from a `width x height` box.
    pub fn inset(width: f64, height: f64, left: f64, right: f64, top: f64, bottom: f64) -> Self {
        Self {
            x: left,
            y: top,
            width: width - left - right,
            height: height - top - bottom,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Palette lookup that cycles, so a series may be longer than its palette.
///
/// An empty palette falls back to the neutral label color.
pub fn color_at<'a>(colors: &[&'a str], i: usize) -> &'a str {
    if colors.is_empty() {
        theme::LABEL_TEXT
    } else {
        colors[i % colors.len()]
    }
}

/// Colors shared by all renderers (dark dashboard theme).
pub mod theme {
    pub const GRID: &str = "#333";
    pub const AXIS: &str = "#666";
    pub const TICK_TEXT: &str = "#aaa";
    pub const TICK_MUTED: &str = "#888";
    pub const LABEL_TEXT: &str = "#ccc";
    pub const VALUE_TEXT: &str = "#ddd";
    pub const DONUT: &str = "#8BC34A";

    pub const ORANGE: &str = "#ff9800";
    pub const GREEN: &str = "#4CAF50";
    pub const LIGHT_BLUE: &str = "#03A9F4";
    pub const LIGHT_GREEN: &str = "#8BC34A";
    pub const SERIES_GREEN: &str = "#66BB6A";
    pub const SWEEP_ORANGE: &str = "#FFA726";
    pub const SWEEP_BLUE: &str = "#42A5F5";

    /// Heat-strip cell fill at a given opacity.
    pub fn heat_fill(opacity: f64) -> String {
        format!("rgba(255,152,0,{})", (opacity * 1000.0).round() / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_at_cycles() {
        let palette = ["a", "b"];
        assert_eq!(color_at(&palette, 0), "a");
        assert_eq!(color_at(&palette, 3), "b");
        assert_eq!(color_at(&[], 7), theme::LABEL_TEXT);
    }

    #[test]
    fn heat_fill_rounds_opacity() {
        assert_eq!(theme::heat_fill(0.15), "rgba(255,152,0,0.15)");
        assert_eq!(theme::heat_fill(0.9), "rgba(255,152,0,0.9)");
    }
}
