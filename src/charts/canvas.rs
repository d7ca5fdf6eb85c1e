/// 2D drawing surface abstraction and HiDPI canvas setup.
///
/// Every renderer in [`crate::charts`] paints through the [`Canvas2d`]
/// trait, which mirrors the subset of the browser `CanvasRenderingContext2D`
/// API the dashboard needs. All coordinates passed to a canvas are CSS
/// pixels; the device-pixel-ratio scaling is applied once by
/// [`setup_canvas`].

/// Horizontal text anchoring for [`Canvas2d::fill_text`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Display and backing-store dimensions of a configured canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasGeometry {
    /// Displayed width in CSS pixels.
    pub css_width: f64,
    /// Displayed height in CSS pixels.
    pub css_height: f64,
    /// Backing bitmap width in device pixels (`floor(css * dpr)`).
    pub backing_width: u32,
    /// Backing bitmap height in device pixels (`floor(css * dpr)`).
    pub backing_height: u32,
    /// Effective device pixel ratio (always `>= 1`).
    pub dpr: f64,
}

impl CanvasGeometry {
    /// Compute the geometry for a CSS size and a raw device pixel ratio.
    pub fn new(css_width: f64, css_height: f64, dpr: f64) -> Self {
        let dpr = clamp_dpr(dpr);
        let css_width = css_width.max(0.0);
        let css_height = css_height.max(0.0);
        Self {
            css_width,
            css_height,
            backing_width: (css_width * dpr).floor() as u32,
            backing_height: (css_height * dpr).floor() as u32,
            dpr,
        }
    }
}

impl Default for CanvasGeometry {
    fn default() -> Self {
        Self::new(300.0, 150.0, 1.0)
    }
}

/// Clamp a device pixel ratio to a minimum of 1.
///
/// Non-finite ratios fall back to 1.
pub fn clamp_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() { dpr.max(1.0) } else { 1.0 }
}

/// Subset of the 2D canvas context used by the chart renderers.
pub trait Canvas2d {
    /// Apply a new geometry. Resets the surface, like assigning
    /// `canvas.width` does in a browser.
    fn configure(&mut self, geometry: CanvasGeometry);

    /// Current geometry.
    fn geometry(&self) -> CanvasGeometry;

    /// Displayed size in CSS pixels.
    fn css_size(&self) -> (f64, f64) {
        let g = self.geometry();
        (g.css_width, g.css_height)
    }

    fn clear_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_line_width(&mut self, width: f64);
    /// Font size in CSS pixels; the family is always sans-serif.
    fn set_font_size(&mut self, px: f64);
    fn set_text_align(&mut self, align: TextAlign);

    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    /// Clockwise arc from `start` to `end` (radians, 0 = +x axis).
    fn arc(&mut self, cx: f64, cy: f64, r: f64, start: f64, end: f64);
    fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64);
    fn fill_text(&mut self, text: &str, x: f64, y: f64);
    /// Advance width of `text` at the current font size.
    fn measure_text(&self, text: &str) -> f64;
}

/// Size a canvas for HiDPI output.
///
/// Sets the displayed size to the CSS dimensions, the backing store to
/// `floor(css * dpr)`, and pre-scales the surface so subsequent drawing
/// uses CSS-pixel coordinates.
pub fn setup_canvas<C: Canvas2d + ?Sized>(
    canvas: &mut C,
    css_width: f64,
    css_height: f64,
    dpr: f64,
) -> CanvasGeometry {
    let geometry = CanvasGeometry::new(css_width, css_height, dpr);
    canvas.configure(geometry);
    geometry
}

/// Approximate advance width of sans-serif text.
///
/// Used by backends that have no font rasteriser. Digits and narrow glyphs
/// are slightly thinner than the average latin glyph.
pub fn approx_text_width(text: &str, font_px: f64) -> f64 {
    text.chars()
        .map(|c| match c {
            'i' | 'l' | 'j' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' => 0.28,
            ' ' | '(' | ')' | '[' | ']' | 'f' | 't' | 'r' => 0.33,
            'm' | 'w' | 'M' | 'W' | '%' | '@' => 0.85,
            c if c.is_ascii_uppercase() => 0.66,
            _ => 0.55,
        })
        .sum::<f64>()
        * font_px
}

/// Draw a rectangle path with rounded corners (fill or stroke afterwards).
pub fn round_rect<C: Canvas2d + ?Sized>(canvas: &mut C, x: f64, y: f64, w: f64, h: f64, r: f64) {
    canvas.begin_path();
    canvas.move_to(x + r, y);
    canvas.arc_to(x + w, y, x + w, y + h, r);
    canvas.arc_to(x + w, y + h, x, y + h, r);
    canvas.arc_to(x, y + h, x, y, r);
    canvas.arc_to(x, y, x + w, y, r);
    canvas.close_path();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
