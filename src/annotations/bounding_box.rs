use crate::annotations::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Reasons a set of coordinates cannot form a bounding box.
#[derive(Debug, Error, PartialEq)]
pub enum BoundingBoxError {
    #[error("Failed to create BoundingBox, value for left > value for right ({left} > {right}).")]
    LeftGreaterThanRight { left: f32, right: f32 },
    #[error("Failed to create BoundingBox, value for top > value for bottom ({top} > {bottom}).")]
    TopGreaterThanBottom { top: f32, bottom: f32 },
    #[error("Failed to create BoundingBox, coordinates must be finite.")]
    NonFinite,
}

/// A struct representing a bounding box.
///
/// A bounding box is a rectangle used to annotate objects in images. Detectors output
/// bounding boxes along with a probability encoding their confidence in that box+category,
/// and the golden fixtures store the boxes a detector is expected to produce.
///
/// This project uses the standard convention of the left side of the image being x=0 and the top
/// of the image being y=0. Boxes may be degenerate (zero width or height) but never inverted.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct BoundingBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    category: String,
}

impl BoundingBox {
    /// Checks if a box has valid parameters before constructing.
    pub fn new(
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        category: String,
    ) -> Result<Self, BoundingBoxError> {
        if ![left, top, right, bottom].iter().all(|v| v.is_finite()) {
            Err(BoundingBoxError::NonFinite)
        } else if left > right {
            Err(BoundingBoxError::LeftGreaterThanRight { left, right })
        } else if top > bottom {
            Err(BoundingBoxError::TopGreaterThanBottom { top, bottom })
        } else {
            Ok(BoundingBox {
                left,
                top,
                right,
                bottom,
                category,
            })
        }
    }

    /// Builds the smallest box containing every point.
    ///
    /// Returns `None` for an empty slice or when a point is not finite.
    pub fn enclosing(points: &[Point], category: String) -> Option<Self> {
        let first = points.first()?;
        let (mut left, mut top, mut right, mut bottom) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            left = left.min(p.x);
            top = top.min(p.y);
            right = right.max(p.x);
            bottom = bottom.max(p.y);
        }
        BoundingBox::new(left, top, right, bottom, category).ok()
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:.1}, {:.1}, {:.1}, {:.1}]",
            self.category, self.left, self.top, self.right, self.bottom
        )
    }
}

/// Geometry shared by every annotation that carries a rectangle.
pub trait BoundingBoxGeometry {
    fn left(&self) -> f32;
    fn top(&self) -> f32;
    fn right(&self) -> f32;
    fn bottom(&self) -> f32;
    fn category(&self) -> &str;

    fn width(&self) -> f32 {
        self.right() - self.left()
    }

    fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    fn area(&self) -> f32 {
        self.width() * self.height()
    }

    fn as_xyxy(&self) -> (f32, f32, f32, f32) {
        (self.left(), self.top(), self.right(), self.bottom())
    }

    /// Area shared by both boxes, zero when they are disjoint.
    fn intersection_area(&self, other: &impl BoundingBoxGeometry) -> f32 {
        let overlap_width =
            (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let overlap_height =
            (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
        overlap_width * overlap_height
    }

    fn intersection_over_union(&self, other: &impl BoundingBoxGeometry) -> f32 {
        let intersection = self.intersection_area(other);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

impl BoundingBoxGeometry for BoundingBox {
    fn left(&self) -> f32 {
        self.left
    }

    fn top(&self) -> f32 {
        self.top
    }

    fn right(&self) -> f32 {
        self.right
    }

    fn bottom(&self) -> f32 {
        self.bottom
    }

    fn category(&self) -> &str {
        &self.category
    }
}
