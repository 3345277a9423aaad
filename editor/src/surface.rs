use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{imageops, ImageFormat, Rgba, RgbaImage};

use crate::error::EditorError;
use crate::geometry::{distance_to_segment, Point, Rect};
use crate::glyphs;
use crate::tools::ShapeKind;

pub const LIGHT_BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const DARK_BACKGROUND: Rgba<u8> = Rgba([30, 30, 30, 255]);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn background(self) -> Rgba<u8> {
        match self {
            Theme::Light => LIGHT_BACKGROUND,
            Theme::Dark => DARK_BACKGROUND,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba<u8>,
    pub width: f64,
}

/// Parses `#rrggbb` into an opaque color.
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Rgba([r, g, b, 255]))
}

pub fn encode_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", BASE64.encode(png))
}

/// Owns the backing pixel buffer and rasterizes every primitive the
/// tools produce. All coordinates are buffer-space; conversion from
/// screen space happens before calls land here.
pub struct Surface {
    pixels: RgbaImage,
    theme: Theme,
    stroke_last: Option<Point>,
    preview_base: Option<RgbaImage>,
}

impl Surface {
    pub fn new(width: u32, height: u32, theme: Theme) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, theme.background()),
            theme,
            stroke_last: None,
            preview_base: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    // --- strokes ---

    pub fn begin_stroke(&mut self, point: Point, style: StrokeStyle) {
        self.fill_circle(point, style.width / 2.0, style.color);
        self.stroke_last = Some(point);
    }

    /// Continues the active stroke with a round-capped segment.
    pub fn extend_stroke(&mut self, point: Point, style: StrokeStyle) {
        let from = match self.stroke_last {
            Some(last) => last,
            None => {
                self.begin_stroke(point, style);
                return;
            }
        };
        self.fill_capsule(from, point, style.width / 2.0, style.color);
        self.stroke_last = Some(point);
    }

    pub fn end_stroke(&mut self) {
        self.stroke_last = None;
    }

    /// Point-mode erase: one filled circle per pointer sample. Samples
    /// are not interpolated, so fast pointer motion leaves gaps; that
    /// matches the documented behavior of this mode.
    pub fn erase_point(&mut self, point: Point, width: f64) {
        self.fill_circle(point, width / 2.0, self.theme.background());
    }

    // --- shapes ---

    /// Captures the committed raster so in-progress previews can be
    /// re-rendered from it without accumulating outline artifacts.
    pub fn begin_shape_preview(&mut self) {
        self.preview_base = Some(self.pixels.clone());
    }

    pub fn draw_shape_preview(&mut self, start: Point, current: Point, kind: ShapeKind, style: StrokeStyle) {
        if let Some(base) = self.preview_base.clone() {
            self.pixels = base;
        }
        self.draw_shape(start, current, kind, style);
    }

    /// Rasterizes the final shape over the pre-preview snapshot.
    pub fn commit_shape(&mut self, start: Point, end: Point, kind: ShapeKind, style: StrokeStyle) {
        if let Some(base) = self.preview_base.take() {
            self.pixels = base;
        }
        self.draw_shape(start, end, kind, style);
    }

    pub fn cancel_shape_preview(&mut self) {
        if let Some(base) = self.preview_base.take() {
            self.pixels = base;
        }
    }

    fn draw_shape(&mut self, start: Point, end: Point, kind: ShapeKind, style: StrokeStyle) {
        let radius = style.width / 2.0;
        for (from, to) in shape_segments(kind, start, end) {
            self.fill_capsule(from, to, radius, style.color);
        }
    }

    // --- text ---

    /// Blits scaled bitmap glyphs with `position` as the top-left
    /// corner of the rendered run.
    pub fn place_text(&mut self, position: Point, content: &str, font_size: f64, color: Rgba<u8>) {
        let scale = glyphs::scale_for(font_size);
        let mut pen_x = position.x.round() as i64;
        let pen_y = position.y.round() as i64;
        for ch in content.chars() {
            let pattern = glyphs::glyph(ch);
            for (row, bits) in pattern.iter().enumerate() {
                for col in 0..glyphs::GLYPH_WIDTH {
                    if (bits >> (glyphs::GLYPH_WIDTH - 1 - col)) & 1 == 1 {
                        self.fill_block(
                            pen_x + (col * scale) as i64,
                            pen_y + (row as u32 * scale) as i64,
                            scale,
                            color,
                        );
                    }
                }
            }
            pen_x += (glyphs::GLYPH_ADVANCE * scale) as i64;
        }
    }

    /// Repaints a rectangle with the background color. Used when a
    /// committed text annotation is re-edited; ink underneath the old
    /// bounding box is lost, same class of limitation as point erase.
    pub fn clear_rect(&mut self, rect: Rect) {
        let background = self.theme.background();
        let (x0, y0, x1, y1) = self.clip(rect);
        for y in y0..y1 {
            for x in x0..x1 {
                self.pixels.put_pixel(x, y, background);
            }
        }
    }

    // --- whole-buffer operations ---

    pub fn clear(&mut self) {
        let background = self.theme.background();
        for pixel in self.pixels.pixels_mut() {
            *pixel = background;
        }
    }

    /// Switches light/dark mode by re-compositing: every pixel still
    /// showing the old background takes the new one, foreground ink is
    /// kept as-is.
    pub fn set_theme(&mut self, theme: Theme) {
        if theme == self.theme {
            return;
        }
        let old = self.theme.background();
        let new = theme.background();
        for pixel in self.pixels.pixels_mut() {
            if *pixel == old {
                *pixel = new;
            }
        }
        self.theme = theme;
    }

    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    pub fn restore(&mut self, snapshot: &RgbaImage) {
        self.pixels = snapshot.clone();
    }

    // --- export / import ---

    pub fn export_full(&self) -> Result<Vec<u8>, EditorError> {
        encode_png(&self.pixels)
    }

    /// Copies `rect` into a fresh minimally-sized buffer and encodes
    /// it. The copy never aliases the live pixels.
    pub fn export_region(&self, rect: Rect) -> Result<Vec<u8>, EditorError> {
        let (x0, y0, x1, y1) = self.clip(rect);
        if x1 <= x0 || y1 <= y0 {
            return Err(EditorError::RegionOutOfBounds);
        }
        let copy = imageops::crop_imm(&self.pixels, x0, y0, x1 - x0, y1 - y0).to_image();
        encode_png(&copy)
    }

    pub fn export_data_url(&self) -> Result<String, EditorError> {
        Ok(encode_data_url(&self.export_full()?))
    }

    /// Loads a serialized slide snapshot: background fill first, then
    /// the decoded raster drawn from the top-left, clipped to fit.
    pub fn load_data_url(&mut self, data: &str) -> Result<(), EditorError> {
        let payload = slateink_shared::strip_data_url(data);
        let bytes = BASE64
            .decode(payload)
            .map_err(|error| EditorError::InvalidSlideData(error.to_string()))?;
        let decoded = image::load_from_memory(&bytes)?.to_rgba8();
        self.clear();
        let width = decoded.width().min(self.width());
        let height = decoded.height().min(self.height());
        for y in 0..height {
            for x in 0..width {
                self.pixels.put_pixel(x, y, *decoded.get_pixel(x, y));
            }
        }
        Ok(())
    }

    // --- rasterization helpers ---

    fn clip(&self, rect: Rect) -> (u32, u32, u32, u32) {
        let x0 = rect.x.floor().max(0.0) as u32;
        let y0 = rect.y.floor().max(0.0) as u32;
        let x1 = ((rect.x + rect.width).ceil().max(0.0) as u32).min(self.width());
        let y1 = ((rect.y + rect.height).ceil().max(0.0) as u32).min(self.height());
        (x0.min(self.width()), y0.min(self.height()), x1, y1)
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba<u8>) {
        let radius = radius.max(0.5);
        let bounds = Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        );
        let (x0, y0, x1, y1) = self.clip(bounds);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = x as f64 - center.x;
                let dy = y as f64 - center.y;
                if dx * dx + dy * dy <= radius * radius {
                    self.pixels.put_pixel(x, y, color);
                }
            }
        }
    }

    fn fill_capsule(&mut self, from: Point, to: Point, radius: f64, color: Rgba<u8>) {
        let radius = radius.max(0.5);
        let bounds = Rect::new(
            from.x.min(to.x) - radius,
            from.y.min(to.y) - radius,
            (to.x - from.x).abs() + radius * 2.0,
            (to.y - from.y).abs() + radius * 2.0,
        );
        let (x0, y0, x1, y1) = self.clip(bounds);
        for y in y0..y1 {
            for x in x0..x1 {
                let d = distance_to_segment(x as f64, y as f64, from.x, from.y, to.x, to.y);
                if d <= radius {
                    self.pixels.put_pixel(x, y, color);
                }
            }
        }
    }

    fn fill_block(&mut self, x: i64, y: i64, size: u32, color: Rgba<u8>) {
        for dy in 0..size as i64 {
            for dx in 0..size as i64 {
                let px = x + dx;
                let py = y + dy;
                if px >= 0 && py >= 0 && (px as u32) < self.width() && (py as u32) < self.height() {
                    self.pixels.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }
}

/// Outline segments for each shape kind spanned by two drag corners.
fn shape_segments(kind: ShapeKind, a: Point, b: Point) -> Vec<(Point, Point)> {
    match kind {
        ShapeKind::None => Vec::new(),
        ShapeKind::Line => vec![(a, b)],
        ShapeKind::Rectangle => {
            let rect = Rect::from_corners(a, b);
            let tl = Point::new(rect.x, rect.y);
            let tr = Point::new(rect.x + rect.width, rect.y);
            let br = Point::new(rect.x + rect.width, rect.y + rect.height);
            let bl = Point::new(rect.x, rect.y + rect.height);
            vec![(tl, tr), (tr, br), (br, bl), (bl, tl)]
        }
        ShapeKind::Triangle => {
            let rect = Rect::from_corners(a, b);
            let apex = Point::new(rect.x + rect.width / 2.0, rect.y);
            let bl = Point::new(rect.x, rect.y + rect.height);
            let br = Point::new(rect.x + rect.width, rect.y + rect.height);
            vec![(apex, br), (br, bl), (bl, apex)]
        }
        ShapeKind::Circle => {
            // Ellipse inscribed in the drag rectangle, approximated by
            // short capsule segments.
            let rect = Rect::from_corners(a, b);
            let cx = rect.x + rect.width / 2.0;
            let cy = rect.y + rect.height / 2.0;
            let rx = rect.width / 2.0;
            let ry = rect.height / 2.0;
            let steps = 64;
            let mut segments = Vec::with_capacity(steps);
            let mut last = Point::new(cx + rx, cy);
            for i in 1..=steps {
                let angle = i as f64 / steps as f64 * std::f64::consts::TAU;
                let next = Point::new(cx + rx * angle.cos(), cy + ry * angle.sin());
                segments.push((last, next));
                last = next;
            }
            segments
        }
    }
}

fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, EditorError> {
    let mut bytes = Vec::new();
    pixels.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
