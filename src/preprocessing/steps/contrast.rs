use crate::error::StageError;
use image::{DynamicImage, Rgba, RgbaImage};

/// Boost contrast around the mid-gray point.
/// Factor > 1.0 increases contrast, < 1.0 decreases it; alpha is untouched.
pub fn apply(image: &DynamicImage, factor: f32) -> Result<DynamicImage, StageError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(StageError::filter(
            "contrast",
            format!("invalid contrast factor {}", factor),
        ));
    }

    let rgba = image.to_rgba8();
    let adjusted = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let stretch = |v: u8| ((v as f32 - 128.0) * factor + 128.0).round().clamp(0.0, 255.0) as u8;
        Rgba([stretch(r), stretch(g), stretch(b), a])
    });
    Ok(DynamicImage::ImageRgba8(adjusted))
}
