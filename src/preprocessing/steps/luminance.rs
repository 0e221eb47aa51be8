use crate::error::StageError;
use image::{DynamicImage, GrayImage, Luma};

/// Rec. 709 perceptual weights
pub const LUMA_RED: f32 = 0.2126;
pub const LUMA_GREEN: f32 = 0.7152;
pub const LUMA_BLUE: f32 = 0.0722;

/// Perceptual luminance of an 8-bit RGB triple, in `0.0..=255.0`.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_RED * r as f32 + LUMA_GREEN * g as f32 + LUMA_BLUE * b as f32
}

/// Convert image to a single-channel luminance image.
/// Alpha is dropped, so the result is fully opaque.
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, StageError> {
    let rgb = image.to_rgb8();
    let gray = GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma(r, g, b).round().clamp(0.0, 255.0) as u8])
    });
    Ok(DynamicImage::ImageLuma8(gray))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_luminance_uses_perceptual_weights() {
        let mut img = RgbImage::new(3, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 255, 0]));
        img.put_pixel(2, 0, Rgb([0, 0, 255]));

        let result = apply(&DynamicImage::ImageRgb8(img)).unwrap();
        let gray = result.as_luma8().expect("single channel output");

        assert_eq!(gray.get_pixel(0, 0).0[0], 54);
        assert_eq!(gray.get_pixel(1, 0).0[0], 182);
        assert_eq!(gray.get_pixel(2, 0).0[0], 18);
    }

    #[test]
    fn test_luminance_drops_alpha() {
        let img = RgbaImage::from_pixel(4, 2, Rgba([200, 200, 200, 10]));
        let result = apply(&DynamicImage::ImageRgba8(img)).unwrap();
        assert!(result.as_luma8().is_some());
        assert!(!result.color().has_alpha());
        assert_eq!(result.width(), 4);
        assert_eq!(result.height(), 2);
    }
}
