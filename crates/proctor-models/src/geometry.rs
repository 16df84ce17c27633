//! Pixel-space geometry shared by detections and landmarks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored as corner coordinates (`x1`,`y1`) top-left and (`x2`,`y2`)
/// bottom-right, matching the detector output format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x1: f64,
    /// Top edge y-coordinate
    pub y1: f64,
    /// Right edge x-coordinate
    pub x2: f64,
    /// Bottom edge y-coordinate
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box without validating corner order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a bounding box, rejecting inverted or non-finite corners.
    pub fn try_new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, BoundingBoxError> {
        let bbox = Self::new(x1, y1, x2, y2);
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(BoundingBoxError::NonFinite(bbox));
        }
        if x1 >= x2 || y1 >= y2 {
            return Err(BoundingBoxError::Inverted(bbox));
        }
        Ok(bbox)
    }

    /// Box width (zero for degenerate boxes).
    #[inline]
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Box height (zero for degenerate boxes).
    #[inline]
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).max(0.0)
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Compute Intersection over Union with another box.
    ///
    /// Returns 0.0 when the boxes do not overlap or either box is degenerate.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Rejected bounding box construction.
#[derive(Debug, Error)]
pub enum BoundingBoxError {
    #[error("Bounding box corners are inverted: {0:?}")]
    Inverted(BoundingBox),

    #[error("Bounding box has non-finite coordinates: {0:?}")]
    NonFinite(BoundingBox),
}

/// A 2D point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_iou() {
        let box1 = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let box2 = BoundingBox::new(50.0, 50.0, 150.0, 150.0);

        let iou = box1.iou(&box2);
        // Intersection: 50x50 = 2500
        // Union: 10000 + 10000 - 2500 = 17500
        assert!((iou - 2500.0 / 17500.0).abs() < 1e-9);
    }

    #[test]
    fn test_iou_is_symmetric() {
        let a = BoundingBox::new(10.0, 20.0, 90.0, 120.0);
        let b = BoundingBox::new(40.0, 0.0, 200.0, 80.0);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn test_iou_with_self_is_one() {
        let a = BoundingBox::new(3.0, 4.0, 30.0, 40.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounding_box_no_overlap() {
        let box1 = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let box2 = BoundingBox::new(100.0, 100.0, 150.0, 150.0);
        assert_eq!(box1.iou(&box2), 0.0);

        // Touching edges share no area
        let box3 = BoundingBox::new(50.0, 0.0, 80.0, 50.0);
        assert_eq!(box1.iou(&box3), 0.0);
    }

    #[test]
    fn test_degenerate_box_has_zero_iou() {
        let line = BoundingBox::new(10.0, 10.0, 10.0, 60.0);
        let other = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        assert_eq!(line.area(), 0.0);
        assert_eq!(line.iou(&other), 0.0);
        assert_eq!(line.iou(&line), 0.0);
    }

    #[test]
    fn test_try_new_rejects_inverted() {
        assert!(BoundingBox::try_new(10.0, 10.0, 5.0, 20.0).is_err());
        assert!(BoundingBox::try_new(0.0, 0.0, f64::NAN, 1.0).is_err());
        assert!(BoundingBox::try_new(0.0, 0.0, 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }
}
