use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::detection::Detection;
use crate::annotations::point::Point;
use imageproc::geometric_transformations::Projection;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised while building or applying a transform.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error(
        "Frame dimensions must be strictly positive, got source {source_width}x{source_height} \
        and target {target_width}x{target_height}."
    )]
    InvalidDimensions {
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    },
    #[error("Rotation of {0} degrees is not a multiple of 90.")]
    UnsupportedRotation(i32),
    #[error("Transform is degenerate and cannot be inverted (determinant {determinant}).")]
    Degenerate { determinant: f32 },
    #[error("Transform produced a non-finite coordinate.")]
    NonFinite,
}

/// A rotation restricted to quarter turns, clockwise in image coordinates (y pointing down).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Quarter and three-quarter turns swap the width and height of a frame.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Exact (cos, sin) of the rotation angle.
    fn cos_sin(self) -> (f32, f32) {
        match self {
            Rotation::Deg0 => (1.0, 0.0),
            Rotation::Deg90 => (0.0, 1.0),
            Rotation::Deg180 => (-1.0, 0.0),
            Rotation::Deg270 => (0.0, -1.0),
        }
    }
}

impl TryFrom<i32> for Rotation {
    type Error = GeometryError;

    /// Accepts any multiple of 90, including negative angles, normalised modulo 360.
    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees.rem_euclid(360) {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            _ => Err(GeometryError::UnsupportedRotation(degrees)),
        }
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// A 2D affine transform stored as the top two rows of a 3x3 matrix.
///
/// `[a, b, c, d, e, f]` maps `(x, y)` to `(a*x + b*y + c, d*x + e*y + f)`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct AffineTransform {
    coefficients: [f32; 6],
}

impl AffineTransform {
    pub fn identity() -> Self {
        AffineTransform {
            coefficients: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    pub fn from_coefficients(coefficients: [f32; 6]) -> Result<Self, GeometryError> {
        if coefficients.iter().all(|c| c.is_finite()) {
            Ok(AffineTransform { coefficients })
        } else {
            Err(GeometryError::NonFinite)
        }
    }

    pub fn coefficients(&self) -> [f32; 6] {
        self.coefficients
    }

    pub fn translation(dx: f32, dy: f32) -> Self {
        AffineTransform {
            coefficients: [1.0, 0.0, dx, 0.0, 1.0, dy],
        }
    }

    pub fn scaling(sx: f32, sy: f32) -> Self {
        AffineTransform {
            coefficients: [sx, 0.0, 0.0, 0.0, sy, 0.0],
        }
    }

    pub fn rotation(rotation: Rotation) -> Self {
        let (cos, sin) = rotation.cos_sin();
        AffineTransform {
            coefficients: [cos, -sin, 0.0, sin, cos, 0.0],
        }
    }

    /// Composes two transforms: the result applies `self` first, then `next`.
    pub fn then(&self, next: &AffineTransform) -> AffineTransform {
        let [a, b, c, d, e, f] = self.coefficients;
        let [na, nb, nc, nd, ne, nf] = next.coefficients;
        AffineTransform {
            coefficients: [
                na * a + nb * d,
                na * b + nb * e,
                na * c + nb * f + nc,
                nd * a + ne * d,
                nd * b + ne * e,
                nd * c + ne * f + nf,
            ],
        }
    }

    pub fn determinant(&self) -> f32 {
        let [a, b, _, d, e, _] = self.coefficients;
        a * e - b * d
    }

    /// Returns the algebraic inverse of the transform.
    ///
    /// Only a zero or non-finite determinant is rejected; heavily downscaling transforms have tiny
    /// but valid determinants.
    pub fn invert(&self) -> Result<AffineTransform, GeometryError> {
        let determinant = self.determinant();
        if !determinant.is_finite() || determinant == 0.0 {
            return Err(GeometryError::Degenerate { determinant });
        }
        let [a, b, c, d, e, f] = self.coefficients;
        let ia = e / determinant;
        let ib = -b / determinant;
        let id = -d / determinant;
        let ie = a / determinant;
        AffineTransform::from_coefficients([
            ia,
            ib,
            -(ia * c + ib * f),
            id,
            ie,
            -(id * c + ie * f),
        ])
    }

    pub fn map_point(&self, point: Point) -> Point {
        let [a, b, c, d, e, f] = self.coefficients;
        Point {
            x: a * point.x + b * point.y + c,
            y: d * point.x + e * point.y + f,
        }
    }

    /// Maps the four corners of a box and returns their axis-aligned bounding box.
    ///
    /// The category is carried over unchanged.
    pub fn map_rect<T: BoundingBoxGeometry>(&self, bbox: &T) -> Result<BoundingBox, GeometryError> {
        let corners = [
            Point { x: bbox.left(), y: bbox.top() },
            Point { x: bbox.right(), y: bbox.top() },
            Point { x: bbox.right(), y: bbox.bottom() },
            Point { x: bbox.left(), y: bbox.bottom() },
        ]
        .map(|corner| self.map_point(corner));
        BoundingBox::enclosing(&corners, bbox.category().to_string()).ok_or(GeometryError::NonFinite)
    }

    pub fn map_detection<T: BoundingBoxGeometry>(
        &self,
        detection: &Detection<T>,
    ) -> Result<Detection<BoundingBox>, GeometryError> {
        Ok(Detection {
            annotation: self.map_rect(&detection.annotation)?,
            confidence: detection.confidence,
        })
    }

    /// Converts into an imageproc projection so images can be warped with the same mapping.
    pub fn to_projection(&self) -> Result<Projection, GeometryError> {
        let [a, b, c, d, e, f] = self.coefficients;
        Projection::from_matrix([a, b, c, d, e, f, 0.0, 0.0, 1.0]).ok_or(
            GeometryError::Degenerate {
                determinant: self.determinant(),
            },
        )
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        AffineTransform::identity()
    }
}

impl fmt::Display for AffineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.coefficients;
        write!(f, "[[{a}, {b}, {c}], [{d}, {e}, {g}], [0, 0, 1]]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rotation_from_degrees() {
        assert_eq!(Rotation::try_from(0), Ok(Rotation::Deg0));
        assert_eq!(Rotation::try_from(90), Ok(Rotation::Deg90));
        assert_eq!(Rotation::try_from(-90), Ok(Rotation::Deg270));
        assert_eq!(Rotation::try_from(450), Ok(Rotation::Deg90));
        assert_eq!(
            Rotation::try_from(45),
            Err(GeometryError::UnsupportedRotation(45))
        );
    }

    #[test]
    fn quarter_turn_is_clockwise_in_image_coordinates() {
        let p = AffineTransform::rotation(Rotation::Deg90).map_point(Point { x: 1.0, y: 0.0 });
        assert_eq!(p, Point { x: 0.0, y: 1.0 });
    }

    #[test]
    fn composition_applies_self_first() {
        let t = AffineTransform::translation(10.0, 0.0).then(&AffineTransform::scaling(2.0, 3.0));
        let p = t.map_point(Point { x: 1.0, y: 1.0 });
        assert_eq!(p, Point { x: 22.0, y: 3.0 });
    }

    #[test]
    fn inverse_undoes_transform() {
        let t = AffineTransform::translation(-320.0, -240.0)
            .then(&AffineTransform::rotation(Rotation::Deg270))
            .then(&AffineTransform::scaling(0.625, 0.46875))
            .then(&AffineTransform::translation(150.0, 150.0));
        let inverse = t.invert().unwrap();
        let p = Point { x: 17.5, y: 401.0 };
        let back = inverse.map_point(t.map_point(p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1e-3);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1e-3);
    }

    #[test]
    fn zero_scale_cannot_be_inverted() {
        let t = AffineTransform::scaling(0.0, 1.0);
        assert_eq!(t.invert(), Err(GeometryError::Degenerate { determinant: 0.0 }));
        assert!(t.to_projection().is_err());
    }

    #[test]
    fn map_rect_takes_bounding_box_of_rotated_corners() {
        let bbox = BoundingBox::new(1.0, 2.0, 4.0, 3.0, "cup".to_string()).unwrap();
        let mapped = AffineTransform::rotation(Rotation::Deg90).map_rect(&bbox).unwrap();
        assert_eq!(mapped.as_xyxy(), (-3.0, 1.0, -2.0, 4.0));
        assert_eq!(mapped.category(), "cup");
    }

    #[test]
    fn non_finite_coefficients_are_rejected() {
        assert_eq!(
            AffineTransform::from_coefficients([1.0, 0.0, f32::INFINITY, 0.0, 1.0, 0.0]),
            Err(GeometryError::NonFinite)
        );
    }
}
