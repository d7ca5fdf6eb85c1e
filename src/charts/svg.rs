/// SVG backend for [`Canvas2d`].
///
/// Paths and text are serialised as SVG elements. The document's pixel size
/// is the canvas backing store (`floor(css * dpr)`) and the content is
/// wrapped in a `scale(dpr)` group, so renderers keep working in CSS pixels
/// while the output is rasterised at device resolution. The element's
/// displayed size is pinned to the CSS size through an inline style.
use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

use super::canvas::{Canvas2d, CanvasGeometry, TextAlign, approx_text_width};

const EPS: f64 = 1e-9;

/// In-memory SVG drawing surface.
#[derive(Debug, Clone)]
pub struct SvgCanvas {
    geometry: CanvasGeometry,
    fill_style: String,
    stroke_style: String,
    line_width: f64,
    font_px: f64,
    align: TextAlign,
    path: String,
    current: Option<(f64, f64)>,
    elements: Vec<String>,
}

impl Default for SvgCanvas {
    fn default() -> Self {
        Self::new(CanvasGeometry::default())
    }
}

impl SvgCanvas {
    /// Create a canvas with the given geometry.
    pub fn new(geometry: CanvasGeometry) -> Self {
        Self {
            geometry,
            fill_style: "#000".to_string(),
            stroke_style: "#000".to_string(),
            line_width: 1.0,
            font_px: 10.0,
            align: TextAlign::Left,
            path: String::new(),
            current: None,
            elements: Vec::new(),
        }
    }

    /// Number of painted elements (after the last full clear).
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Serialise the canvas as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let g = self.geometry;
        let mut out = String::with_capacity(256 + self.elements.iter().map(String::len).sum::<usize>());
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{bw}" height="{bh}" viewBox="0 0 {bw} {bh}" style="width:{cw}px;height:{ch}px">"#,
            bw = g.backing_width,
            bh = g.backing_height,
            cw = fmt_num(g.css_width),
            ch = fmt_num(g.css_height),
        );
        let _ = write!(out, r#"<g transform="scale({})">"#, fmt_num(g.dpr));
        for el in &self.elements {
            out.push_str(el);
        }
        out.push_str("</g></svg>");
        out
    }

    fn push_cmd(&mut self, cmd: char, x: f64, y: f64) {
        let _ = write!(self.path, "{cmd}{} {} ", fmt_num(x), fmt_num(y));
        self.current = Some((x, y));
    }

    fn push_arc_segment(&mut self, r: f64, large: bool, sweep: bool, x: f64, y: f64) {
        let _ = write!(
            self.path,
            "A{r} {r} 0 {} {} {} {} ",
            u8::from(large),
            u8::from(sweep),
            fmt_num(x),
            fmt_num(y),
            r = fmt_num(r),
        );
        self.current = Some((x, y));
    }
}

impl Canvas2d for SvgCanvas {
    fn configure(&mut self, geometry: CanvasGeometry) {
        *self = Self::new(geometry);
    }

    fn geometry(&self) -> CanvasGeometry {
        self.geometry
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let g = self.geometry;
        // SVG has no erase; only a full clear is meaningful.
        if x <= 0.0 && y <= 0.0 && x + w >= g.css_width && y + h >= g.css_height {
            self.elements.clear();
        }
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

    fn begin_path(&mut self) {
        self.path.clear();
        self.current = None;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push_cmd('M', x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        if self.current.is_none() {
            self.push_cmd('M', x, y);
        } else {
            self.push_cmd('L', x, y);
        }
    }

    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64) {
        let point = |a: f64| (cx + r * a.cos(), cy + r * a.sin());
        let (sx, sy) = point(start);
        self.line_to(sx, sy);

        let sweep = end - start;
        if r <= 0.0 || sweep.abs() < EPS {
            return;
        }
        if sweep.abs() >= TAU - EPS {
            // A single SVG arc cannot describe a full circle.
            let dir = sweep.signum();
            let (mx, my) = point(start + PI * dir);
            let (ex, ey) = point(start + TAU * dir);
            self.push_arc_segment(r, false, dir > 0.0, mx, my);
            self.push_arc_segment(r, false, dir > 0.0, ex, ey);
        } else {
            let (ex, ey) = point(end);
            self.push_arc_segment(r, sweep.abs() > PI, sweep > 0.0, ex, ey);
        }
    }

    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64) {
        let Some((x0, y0)) = self.current else {
            self.move_to(x1, y1);
            return;
        };
        let (v1x, v1y) = (x0 - x1, y0 - y1);
        let (v2x, v2y) = (x2 - x1, y2 - y1);
        let l1 = v1x.hypot(v1y);
        let l2 = v2x.hypot(v2y);
        if r <= 0.0 || l1 < EPS || l2 < EPS {
            self.line_to(x1, y1);
            return;
        }
        let cos = ((v1x * v2x + v1y * v2y) / (l1 * l2)).clamp(-1.0, 1.0);
        let angle = cos.acos();
        if angle < EPS || (PI - angle) < EPS {
            self.line_to(x1, y1);
            return;
        }
        let d = r / (angle / 2.0).tan();
        let (t1x, t1y) = (x1 + v1x / l1 * d, y1 + v1y / l1 * d);
        let (t2x, t2y) = (x1 + v2x / l2 * d, y1 + v2y / l2 * d);
        let cross = v1x * v2y - v1y * v2x;
        self.line_to(t1x, t1y);
        self.push_arc_segment(r, false, cross < 0.0, t2x, t2y);
    }

    fn close_path(&mut self) {
        if !self.path.is_empty() {
            self.path.push_str("Z ");
        }
    }

    fn fill(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let el = format!(
            r#"<path d="{}" fill="{}"/>"#,
            self.path.trim_end(),
            escape_xml(&self.fill_style)
        );
        self.elements.push(el);
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let el = format!(
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
            self.path.trim_end(),
            escape_xml(&self.stroke_style),
            fmt_num(self.line_width)
        );
        self.elements.push(el);
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        // Canvas accepts negative extents; SVG does not.
        let (x, w) = if w < 0.0 { (x + w, -w) } else { (x, w) };
        let (y, h) = if h < 0.0 { (y + h, -h) } else { (y, h) };
        let el = format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            fmt_num(x),
            fmt_num(y),
            fmt_num(w),
            fmt_num(h),
            escape_xml(&self.fill_style)
        );
        self.elements.push(el);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        let anchor = match self.align {
            TextAlign::Left => "start",
            TextAlign::Center => "middle",
            TextAlign::Right => "end",
        };
        let el = format!(
            r#"<text x="{}" y="{}" font-family="sans-serif" font-size="{}" text-anchor="{anchor}" fill="{}">{}</text>"#,
            fmt_num(x),
            fmt_num(y),
            fmt_num(self.font_px),
            escape_xml(&self.fill_style),
            escape_xml(text)
        );
        self.elements.push(el);
    }

    fn measure_text(&self, text: &str) -> f64 {
        approx_text_width(text, self.font_px)
    }
}

/// Format a coordinate with at most two decimals and no trailing zeros.
fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Escape text for use in XML content and attribute values.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
