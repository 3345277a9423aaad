/// Point in buffer coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in buffer coordinates. `width`/`height` are
/// always non-negative once built through [`Rect::from_corners`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds the rectangle spanned by two drag corners, normalizing
    /// so the origin is the top-left regardless of drag direction.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// Distance from `(px, py)` to the segment `(x1, y1)..(x2, y2)`.
pub fn distance_to_segment(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
    }
    let t = ((px - x1) * dx + (py - y1) * dy) / (dx * dx + dy * dy);
    let t = t.clamp(0.0, 1.0);
    let proj_x = x1 + t * dx;
    let proj_y = y1 + t * dy;
    ((px - proj_x).powi(2) + (py - proj_y).powi(2)).sqrt()
}

/// Maps a screen-space point onto the backing buffer. The buffer
/// resolution can exceed the displayed element size, so both axes are
/// scaled by their own ratio.
pub fn screen_to_buffer(
    point: Point,
    display_width: f64,
    display_height: f64,
    buffer_width: u32,
    buffer_height: u32,
) -> Point {
    if display_width <= 0.0 || display_height <= 0.0 {
        return point;
    }
    Point {
        x: point.x * buffer_width as f64 / display_width,
        y: point.y * buffer_height as f64 / display_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_corners_normalizes_any_drag_direction() {
        let rect = Rect::from_corners(Point::new(40.0, 50.0), Point::new(10.0, 20.0));
        assert_eq!(rect.x, 10.0);
        assert_eq!(rect.y, 20.0);
        assert_eq!(rect.width, 30.0);
        assert_eq!(rect.height, 30.0);
    }

    #[test]
    fn segment_distance_handles_degenerate_segment() {
        let d = distance_to_segment(3.0, 4.0, 0.0, 0.0, 0.0, 0.0);
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn screen_points_scale_to_buffer_resolution() {
        let mapped = screen_to_buffer(Point::new(100.0, 50.0), 400.0, 200.0, 800, 600);
        assert_eq!(mapped.x, 200.0);
        assert_eq!(mapped.y, 150.0);
    }
}
