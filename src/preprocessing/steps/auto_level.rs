use super::luminance::luma;
use crate::error::StageError;
use image::{DynamicImage, Rgba, RgbaImage};

/// Stretch the luminance histogram so the darkest pixel maps to 0 and the
/// brightest to 255. The same linear map is applied to every color channel.
pub fn apply(image: &DynamicImage) -> Result<DynamicImage, StageError> {
    let rgba = image.to_rgba8();
    let (min_val, max_val) = find_min_max(&rgba);

    // Uniform image, nothing to stretch
    if max_val - min_val < 1.0 {
        return Ok(DynamicImage::ImageRgba8(rgba));
    }

    let scale = 255.0 / (max_val - min_val);
    let leveled = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let level = |v: u8| ((v as f32 - min_val) * scale).round().clamp(0.0, 255.0) as u8;
        Rgba([level(r), level(g), level(b), a])
    });

    Ok(DynamicImage::ImageRgba8(leveled))
}

fn find_min_max(img: &RgbaImage) -> (f32, f32) {
    let mut min = 255.0_f32;
    let mut max = 0.0_f32;

    for pixel in img.pixels() {
        let [r, g, b, _] = pixel.0;
        let val = luma(r, g, b);
        min = min.min(val);
        max = max.max(val);
    }

    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_level_stretches_histogram() {
        // Low-contrast gray ramp (values 50-185)
        let img = RgbaImage::from_fn(10, 10, |x, _| {
            let val = 50 + (x as u8 * 15);
            Rgba([val, val, val, 255])
        });

        let result = apply(&DynamicImage::ImageRgba8(img)).unwrap().to_rgba8();
        let (min, max) = find_min_max(&result);

        assert!(min < 1.0, "Expected min near 0, got {}", min);
        assert!(max > 254.0, "Expected max near 255, got {}", max);
    }

    #[test]
    fn test_auto_level_handles_uniform_image() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([128, 128, 128, 255]));
        let result = apply(&DynamicImage::ImageRgba8(img)).unwrap().to_rgba8();
        assert_eq!(result.get_pixel(0, 0).0[0], 128);
    }
}
