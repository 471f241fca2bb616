//! Overlay geometry shared by the renderer and its tests
//!
//! All sizes are in media pixels. Stroke widths and marker size scale with
//! the frame so the overlay looks the same at any resolution.

use crate::domain::Point;

/// Committed zone outline constants
pub mod zone {
    /// Stroke width as a fraction of the media width
    pub const STROKE_RATIO: f32 = 0.005;
}

/// In-progress sketch constants
pub mod sketch {
    /// Fixed stroke width for the unfinished shape
    pub const THICKNESS: f32 = 4.0;
}

/// Crossing direction marker drawn at the middle of every line zone
pub mod marker {
    use crate::domain::Point;

    /// Half of the triangle's base, in media pixels
    pub const HALF_BASE: f32 = 15.0;
    /// Apex distance from the line as a fraction of the media height
    pub const APEX_RATIO: f32 = 0.04;

    /// Triangle `[apex, base_right, base_left]` for the line `start -> end`
    ///
    /// The marker is modelled pointing up (-y) around the origin, rotated by
    /// the line angle minus 90° and moved onto the line's midpoint.
    pub fn triangle(start: Point, end: Point, media_height: f32) -> [Point; 3] {
        let mid = start.midpoint(end);
        let angle = (end.y - start.y).atan2(end.x - start.x) - std::f32::consts::FRAC_PI_2;
        let (sin, cos) = angle.sin_cos();

        // Rotate a marker-local point and move it onto the midpoint
        let place = |x: f32, y: f32| Point {
            x: mid.x + x * cos - y * sin,
            y: mid.y + x * sin + y * cos,
        };

        [
            place(0.0, -media_height * APEX_RATIO),
            place(HALF_BASE, 0.0),
            place(-HALF_BASE, 0.0),
        ]
    }
}

/// Stroke width of a committed zone for a given media width
#[inline]
pub fn zone_stroke_width(media_width: u32) -> f32 {
    media_width as f32 * zone::STROKE_RATIO
}

/// Line zones get a direction marker; polygons do not
#[inline]
pub fn line_endpoints(points: &[Point]) -> Option<(Point, Point)> {
    match points {
        [start, end] => Some((*start, *end)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn test_stroke_width_scales_with_media() {
        assert!((zone_stroke_width(1920) - 9.6).abs() < 1e-4);
        assert!((zone_stroke_width(1000) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_horizontal_line_marker() {
        let [apex, right, left] =
            marker::triangle(Point::new(0.0, 100.0), Point::new(200.0, 100.0), 1000.0);
        assert!(close(apex, Point::new(60.0, 100.0)));
        assert!(close(right, Point::new(100.0, 85.0)));
        assert!(close(left, Point::new(100.0, 115.0)));
    }

    #[test]
    fn test_reversed_line_flips_marker() {
        let [apex, _, _] =
            marker::triangle(Point::new(200.0, 100.0), Point::new(0.0, 100.0), 1000.0);
        assert!(close(apex, Point::new(140.0, 100.0)));
    }

    #[test]
    fn test_vertical_line_marker() {
        // Rotation cancels out for a top-to-bottom line
        let [apex, _, _] = marker::triangle(Point::new(50.0, 0.0), Point::new(50.0, 100.0), 500.0);
        assert!(close(apex, Point::new(50.0, 30.0)));
    }

    #[test]
    fn test_line_endpoints() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(line_endpoints(&[a, b]), Some((a, b)));
        assert_eq!(line_endpoints(&[a, b, a, b]), None);
    }
}
