use super::luminance::luma;
use crate::error::StageError;
use image::{DynamicImage, Rgba, RgbaImage};

/// Remove all color while staying in RGBA, so colored marker strokes and
/// background tints collapse onto a single luminance axis.
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, StageError> {
    let rgba = image.to_rgba8();
    let gray = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let l = luma(r, g, b).round().clamp(0.0, 255.0) as u8;
        Rgba([l, l, l, a])
    });
    Ok(DynamicImage::ImageRgba8(gray))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desaturate_equalizes_channels_and_keeps_alpha() {
        let img = RgbaImage::from_pixel(5, 5, Rgba([200, 40, 90, 128]));
        let result = apply(&DynamicImage::ImageRgba8(img)).unwrap();
        let out = result.to_rgba8();

        for pixel in out.pixels() {
            let [r, g, b, a] = pixel.0;
            assert_eq!(r, g);
            assert_eq!(g, b);
            assert_eq!(a, 128);
        }
    }
}
