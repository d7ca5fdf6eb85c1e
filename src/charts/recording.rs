/// A [`Canvas2d`] that records every drawing call.
///
/// Used by tests (and by anyone who wants to inspect what a renderer
/// painted) to assert on geometry without rasterising anything.
use super::canvas::{Canvas2d, CanvasGeometry, TextAlign, approx_text_width};

/// A single recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        style: String,
    },
    FillText {
        text: String,
        x: f64,
        y: f64,
        align: TextAlign,
        style: String,
    },
    Arc {
        cx: f64,
        cy: f64,
        r: f64,
        start: f64,
        end: f64,
    },
    ArcTo {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        r: f64,
    },
    MoveTo {
        x: f64,
        y: f64,
    },
    LineTo {
        x: f64,
        y: f64,
    },
    Fill {
        style: String,
    },
    Stroke {
        style: String,
        width: f64,
    },
}

/// Recording canvas with the same state model as the SVG backend.
#[derive(Debug, Clone, Default)]
pub struct RecordingCanvas {
    geometry: CanvasGeometry,
    fill_style: String,
    stroke_style: String,
    line_width: f64,
    font_px: f64,
    align: TextAlign,
    pub ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    /// Create a recording canvas already configured with a geometry.
    pub fn with_geometry(geometry: CanvasGeometry) -> Self {
        let mut canvas = Self::default();
        canvas.configure(geometry);
        canvas
    }

    /// All `fill_rect` calls, in order.
    pub fn rects(&self) -> Vec<(f64, f64, f64, f64, &str)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { x, y, w, h, style } => Some((*x, *y, *w, *h, style.as_str())),
                _ => None,
            })
            .collect()
    }

    /// All text drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All `arc` calls as `(start, end)` angle pairs.
    pub fn arcs(&self) -> Vec<(f64, f64)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Arc { start, end, .. } => Some((*start, *end)),
                _ => None,
            })
            .collect()
    }
}

impl Canvas2d for RecordingCanvas {
    fn configure(&mut self, geometry: CanvasGeometry) {
        *self = Self {
            geometry,
            line_width: 1.0,
            font_px: 10.0,
            fill_style: "#000".to_string(),
            stroke_style: "#000".to_string(),
            ..Self::default()
        };
    }

    fn geometry(&self) -> CanvasGeometry {
        self.geometry
    }

    fn clear_rect(&mut self, _x: f64, _y: f64, _w: f64, _h: f64) {
        self.ops.push(DrawOp::Clear);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.fill_style = style.to_string();
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.stroke_style = style.to_string();
    }

    fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    fn set_font_size(&mut self, px: f64) {
        self.font_px = px;
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.align = align;
    }

    fn begin_path(&mut self) {}

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo { x, y });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo { x, y });
    }

    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64) {
        self.ops.push(DrawOp::Arc {
            cx,
            cy,
            r,
            start,
            end,
        });
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64) {
        self.ops.push(DrawOp::ArcTo { x1, y1, x2, y2, r });
    }

    fn close_path(&mut self) {}

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill {
            style: self.fill_style.clone(),
        });
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke {
            style: self.stroke_style.clone(),
            width: self.line_width,
        });
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            w,
            h,
            style: self.fill_style.clone(),
        });
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            x,
            y,
            align: self.align,
            style: self.fill_style.clone(),
        });
    }

    fn measure_text(&self, text: &str) -> f64 {
        approx_text_width(text, self.font_px)
    }
}
