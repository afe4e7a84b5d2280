use glam::Vec2;
use rstar::AABB;
use serde::{Deserialize, Serialize};

/// An axis-aligned box in page image coordinates (origin top-left).
///
/// The recognizer reports boxes as `[x1, y1, x2, y2]`, which is also the wire
/// form used by serde. Boxes are stored exactly as received: an inverted or
/// zero-area box is kept as-is and reported through [`Bbox::is_degenerate`],
/// so that it never overlaps anything instead of failing the page.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Bbox {
    /// Top-left corner `(x1, y1)`.
    pub min: Vec2,
    /// Bottom-right corner `(x2, y2)`.
    pub max: Vec2,
}

impl Bbox {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Builds a box from the recognizer's `x1, y1, x2, y2` order.
    ///
    /// # Example
    /// ```
    /// use pagemerge_core::analysis::bbox::Bbox;
    /// let bbox = Bbox::from_corners(10.0, 20.0, 50.0, 80.0);
    /// assert_eq!(bbox.area(), 2400.0);
    /// ```
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(Vec2::new(x1, y1), Vec2::new(x2, y2))
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// True when the box is inverted on either axis or has no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Area of the box, zero for degenerate boxes.
    pub fn area(&self) -> f32 {
        if self.is_degenerate() {
            return 0.0;
        }
        self.width() * self.height()
    }

    /// Area shared with `other`, zero when they only touch or do not meet.
    pub fn intersection(&self, other: &Self) -> f32 {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);

        if max.x > min.x && max.y > min.y {
            (max.x - min.x) * (max.y - min.y)
        } else {
            0.
        }
    }

    /// Intersection over Union.
    ///
    /// Degenerate boxes have an IoU of 0.0 with everything, themselves included.
    ///
    /// # Example
    /// ```
    /// use pagemerge_core::analysis::bbox::Bbox;
    /// let a = Bbox::from_corners(0.0, 0.0, 4.0, 2.0);
    /// let b = Bbox::from_corners(2.0, 0.0, 6.0, 2.0);
    /// assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-6);
    /// ```
    pub fn iou(&self, other: &Self) -> f32 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.0;
        }

        let intersection_area = self.intersection(other);
        let union_area = self.area() + other.area() - intersection_area;

        if union_area > 0.0 {
            intersection_area / union_area
        } else {
            0.0
        }
    }

    /// Scales both corners per axis, used to map recognizer coordinates onto
    /// a page image of a different resolution.
    pub fn scale(&self, factor: Vec2) -> Self {
        Self::new(self.min * factor, self.max * factor)
    }

    /// Clamps the box into `[min_bounds, max_bounds]`.
    pub fn clamp(&self, min_bounds: Vec2, max_bounds: Vec2) -> Self {
        Self {
            min: self.min.max(min_bounds),
            max: self.max.min(max_bounds),
        }
    }

    /// R-tree envelope of the box.
    pub fn envelope(&self) -> AABB<[f32; 2]> {
        AABB::from_corners([self.min.x, self.min.y], [self.max.x, self.max.y])
    }
}

impl From<[f32; 4]> for Bbox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self::from_corners(x1, y1, x2, y2)
    }
}

impl From<Bbox> for [f32; 4] {
    fn from(bbox: Bbox) -> Self {
        [bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y]
    }
}
