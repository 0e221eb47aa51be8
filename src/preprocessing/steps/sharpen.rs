use super::luminance::luma;
use crate::error::StageError;
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::filter::filter3x3;

/// Apply Laplacian-based sharpening to luminance only.
///
/// The kernel has center weight `1 + 4 * strength` and `-strength` on the four
/// direct neighbours. The resulting luminance change is added equally to each
/// color channel, so hue is not shifted.
pub fn apply(image: &DynamicImage, strength: f32) -> Result<DynamicImage, StageError> {
    if !strength.is_finite() || strength < 0.0 {
        return Err(StageError::filter(
            "sharpen",
            format!("invalid sharpen strength {}", strength),
        ));
    }

    let rgba = image.to_rgba8();
    let gray = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, _] = rgba.get_pixel(x, y).0;
        Luma([luma(r, g, b).round().clamp(0.0, 255.0) as u8])
    });

    let kernel: [f32; 9] = [
        0.0,
        -strength,
        0.0,
        -strength,
        1.0 + 4.0 * strength,
        -strength,
        0.0,
        -strength,
        0.0,
    ];
    let sharpened: GrayImage = filter3x3(&gray, &kernel);

    let out = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let delta = sharpened.get_pixel(x, y).0[0] as f32 - gray.get_pixel(x, y).0[0] as f32;
        let shift = |v: u8| (v as f32 + delta).round().clamp(0.0, 255.0) as u8;
        Rgba([shift(r), shift(g), shift(b), a])
    });

    Ok(DynamicImage::ImageRgba8(out))
}
