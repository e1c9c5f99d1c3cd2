//! Relative and pixel-space geometry
//!
//! Everything persisted by the console is stored as fractions (0-1) of the
//! container so that it survives resolution changes. Pixel rectangles only
//! exist transiently while hit-testing or drawing.

use serde::{Deserialize, Serialize};

/// Decimal places kept for stored relative coordinates
pub const COORDINATE_PRECISION: i32 = 3;

/// Round a relative coordinate to the stored precision
pub fn round3(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_PRECISION);
    (value * scale).round() / scale
}

/// Round a relative coordinate up to the stored precision
pub fn ceil3(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_PRECISION);
    // Trim float noise so that 0.01 does not become 0.011
    ((value * scale) - 1e-9).ceil() / scale
}

/// A point in container pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    /// Horizontal offset from the container's left edge
    pub x: f64,
    /// Vertical offset from the container's top edge
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`
    pub fn offset_from(&self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

/// Pixel dimensions of a container or canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Size {
    /// Create a new size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is zero, in which case nothing can be mapped
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Length of the shorter side
    pub fn shorter_side(&self) -> f64 {
        self.width.min(self.height)
    }
}

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelRect {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width, may be negative while a draw is in progress
    pub width: f64,
    /// Height, may be negative while a draw is in progress
    pub height: f64,
}

impl PixelRect {
    /// Create a new pixel rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning two corners in any order
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x - a.x, b.y - a.y)
    }

    /// Same rectangle with a non-negative width and height
    pub fn normalized(&self) -> Self {
        Self::new(
            self.x.min(self.x + self.width),
            self.y.min(self.y + self.height),
            self.width.abs(),
            self.height.abs(),
        )
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }
}

/// Axis-aligned rectangle in relative (0-1) container coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RelativeRect {
    /// Left edge as a fraction of container width
    pub x: f64,
    /// Top edge as a fraction of container height
    pub y: f64,
    /// Width as a fraction of container width
    pub width: f64,
    /// Height as a fraction of container height
    pub height: f64,
}

impl RelativeRect {
    /// Create a new relative rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Project into pixel space for the given container
    pub fn to_pixels(&self, container: Size) -> PixelRect {
        PixelRect::new(
            self.x * container.width,
            self.y * container.height,
            self.width * container.width,
            self.height * container.height,
        )
    }

    /// Map a pixel rectangle back to relative coordinates, rounded to storage precision
    pub fn from_pixels(rect: PixelRect, container: Size) -> Self {
        if container.is_empty() {
            return Self::default();
        }
        let rect = rect.normalized();
        Self::new(
            round3(rect.x / container.width),
            round3(rect.y / container.height),
            round3(rect.width / container.width),
            round3(rect.height / container.height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round3() {
        assert_eq!(round3(0.12345), 0.123);
        assert_eq!(round3(0.1236), 0.124);
        assert_eq!(round3(1.0), 1.0);
    }

    #[test]
    fn test_ceil3_does_not_overshoot_exact_values() {
        assert_eq!(ceil3(0.01), 0.01);
        assert_eq!(ceil3(0.0075), 0.008);
    }

    #[test]
    fn test_relative_to_pixels() {
        let rect = RelativeRect::new(0.1, 0.1, 0.2, 0.2);
        let px = rect.to_pixels(Size::new(800.0, 600.0));
        assert!((px.x - 80.0).abs() < 1e-9);
        assert!((px.y - 60.0).abs() < 1e-9);
        assert!((px.right() - 240.0).abs() < 1e-9);
        assert!((px.bottom() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalized_handles_reverse_drag() {
        let rect = PixelRect::from_corners(Point::new(200.0, 150.0), Point::new(100.0, 50.0));
        let n = rect.normalized();
        assert_eq!(n, PixelRect::new(100.0, 50.0, 100.0, 100.0));
    }

    #[test]
    fn test_from_pixels_empty_container() {
        let rect = RelativeRect::from_pixels(PixelRect::new(1.0, 1.0, 5.0, 5.0), Size::default());
        assert_eq!(rect, RelativeRect::default());
    }
}
