//! Geometry types.
//!
//! Coordinates are ratios of the page width and height, with the origin at
//! the top-left corner of the page.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Width as a ratio of page width
    pub width: f64,

    /// Height as a ratio of page height
    pub height: f64,

    /// Left edge as a ratio of page width
    pub left: f64,

    /// Top edge as a ratio of page height
    pub top: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            left,
            top,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Area of the box.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Smallest box covering both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(left, top, right - left, bottom - top)
    }
}

/// A polygon vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position as a ratio of page width
    pub x: f64,

    /// Vertical position as a ratio of page height
    pub y: f64,
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Location of a block on its page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Coarse axis-aligned box
    pub bounding_box: BoundingBox,

    /// Fine-grained outline
    pub polygon: Vec<Point>,
}

impl Geometry {
    /// Create geometry from a bounding box alone.
    pub fn from_box(bounding_box: BoundingBox) -> Self {
        Self {
            bounding_box,
            polygon: Vec::new(),
        }
    }

    /// Create geometry with a polygon.
    pub fn with_polygon(mut self, polygon: Vec<Point>) -> Self {
        self.polygon = polygon;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_edges() {
        let bbox = BoundingBox::new(0.1, 0.2, 0.5, 0.25);
        assert!((bbox.right() - 0.6).abs() < 1e-9);
        assert!((bbox.bottom() - 0.45).abs() < 1e-9);
        assert!((bbox.area() - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_box_union() {
        let a = BoundingBox::new(0.0, 0.0, 0.5, 0.5);
        let b = BoundingBox::new(0.4, 0.4, 0.5, 0.5);

        let u = a.union(&b);
        assert_eq!(u.left, 0.0);
        assert!((u.right() - 0.9).abs() < 1e-9);
        assert!((u.bottom() - 0.9).abs() < 1e-9);
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_geometry_default_is_empty() {
        let geometry = Geometry::default();
        assert_eq!(geometry.bounding_box.area(), 0.0);
        assert!(geometry.polygon.is_empty());
    }
}
