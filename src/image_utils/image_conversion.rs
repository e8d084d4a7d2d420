use image::{self, RgbImage};
use ndarray::Array4;

/// Converts an rgb8 image into the (1, 3, height, width) layout detectors consume.
pub fn convert_rgb_image_to_owned_array(rgb_image: &RgbImage) -> Array4<f32> {
    let mut image_array = Array4::zeros((
        1,
        3,
        rgb_image.height() as usize,
        rgb_image.width() as usize,
    ));
    for (x, y, pixel) in rgb_image.enumerate_pixels() {
        let (row, col) = (y as usize, x as usize);
        let [r, g, b] = pixel.0;
        image_array[[0, 0, row, col]] = (r as f32) / 255.;
        image_array[[0, 1, row, col]] = (g as f32) / 255.;
        image_array[[0, 2, row, col]] = (b as f32) / 255.;
    }
    image_array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient_image() -> RgbImage {
        RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 100) as u8, 255]))
    }

    #[test]
    fn rgb_image_to_array_is_channel_first() {
        let arr = convert_rgb_image_to_owned_array(&gradient_image());
        assert_eq!(arr.shape(), &[1, 3, 3, 4]);
        assert_eq!(arr[[0, 0, 0, 3]], 180.0 / 255.0);
        assert_eq!(arr[[0, 1, 2, 0]], 200.0 / 255.0);
        assert_eq!(arr[[0, 2, 1, 1]], 1.0);
    }
}
