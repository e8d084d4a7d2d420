use crate::image_transformation::affine::{AffineTransform, GeometryError, Rotation};

/// Computes the transform from a source frame into a target frame (usually the model input crop).
///
/// The source centre is moved to the origin, the frame is rotated, scaled onto the target and
/// finally moved to the target centre. Quarter turns swap the source dimensions before the scale
/// factors are derived. When `maintain_aspect_ratio` is set the smaller of the two factors is used
/// on both axes so the whole frame fits inside the target; otherwise each axis is stretched to
/// fill the target exactly.
pub fn compute_transform(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
    rotation: Rotation,
    maintain_aspect_ratio: bool,
) -> Result<AffineTransform, GeometryError> {
    if source_width == 0 || source_height == 0 || target_width == 0 || target_height == 0 {
        return Err(GeometryError::InvalidDimensions {
            source_width,
            source_height,
            target_width,
            target_height,
        });
    }

    let (effective_width, effective_height) = if rotation.swaps_axes() {
        (source_height as f32, source_width as f32)
    } else {
        (source_width as f32, source_height as f32)
    };
    let scale_x = target_width as f32 / effective_width;
    let scale_y = target_height as f32 / effective_height;
    let (scale_x, scale_y) = if maintain_aspect_ratio {
        let scale = scale_x.min(scale_y);
        (scale, scale)
    } else {
        (scale_x, scale_y)
    };

    let transform = AffineTransform::translation(
        -(source_width as f32) / 2.0,
        -(source_height as f32) / 2.0,
    )
    .then(&AffineTransform::rotation(rotation))
    .then(&AffineTransform::scaling(scale_x, scale_y))
    .then(&AffineTransform::translation(
        target_width as f32 / 2.0,
        target_height as f32 / 2.0,
    ));
    Ok(transform)
}

/// The pair of transforms used for one detection session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMapping {
    pub frame_to_crop: AffineTransform,
    pub crop_to_frame: AffineTransform,
}

impl FrameMapping {
    pub fn new(
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
        rotation: Rotation,
        maintain_aspect_ratio: bool,
    ) -> Result<Self, GeometryError> {
        let frame_to_crop = compute_transform(
            source_width,
            source_height,
            target_width,
            target_height,
            rotation,
            maintain_aspect_ratio,
        )?;
        let crop_to_frame = frame_to_crop.invert()?;
        Ok(FrameMapping {
            frame_to_crop,
            crop_to_frame,
        })
    }
}
