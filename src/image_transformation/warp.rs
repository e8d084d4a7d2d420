use crate::image_transformation::affine::{AffineTransform, GeometryError};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, warp_into};

/// Draws a frame into a new black crop of the given size through `frame_to_crop`, sampling the
/// nearest source pixel (no filtering).
///
/// Crop pixels whose pre-image falls outside the frame stay black, which is what the letterbox
/// bands look like when the aspect ratio is maintained.
pub fn warp_into_crop(
    image: &RgbImage,
    frame_to_crop: &AffineTransform,
    crop_width: u32,
    crop_height: u32,
) -> Result<RgbImage, GeometryError> {
    let projection = frame_to_crop.to_projection()?;
    let mut crop = RgbImage::new(crop_width, crop_height);
    warp_into(
        image,
        &projection,
        Interpolation::Nearest,
        Rgb([0, 0, 0]),
        &mut crop,
    );
    Ok(crop)
}
