use image::{self, ImageResult, RgbImage};
use std::path::Path;

/// Opens and decodes an image file. Missing files and undecodable data are returned as errors.
pub fn read_image_as_rgb8(filepath: &Path) -> ImageResult<RgbImage> {
    Ok(image::open(filepath)?.into_rgb8())
}
