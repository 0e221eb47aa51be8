use crate::error::StageError;
use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Blur radius used to estimate the local background
const SMOOTHING_SIGMA: f32 = 1.0;

/// Light, edge-preserving noise reduction on luminance.
///
/// Pixels whose deviation from the local (blurred) value is below
/// `noise_level * 255` are treated as sensor noise and replaced by the local
/// value; larger deviations are character strokes and are kept. A mild
/// unsharp mask with weight `sharpness` then restores stroke edges.
pub fn apply(image: &DynamicImage, noise_level: f32, sharpness: f32) -> Result<DynamicImage, StageError> {
    if !noise_level.is_finite() || noise_level < 0.0 || !sharpness.is_finite() || sharpness < 0.0 {
        return Err(StageError::filter(
            "denoise",
            format!("invalid parameters noise_level={} sharpness={}", noise_level, sharpness),
        ));
    }

    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, SMOOTHING_SIGMA);
    let tolerance = noise_level * 255.0;

    let smoothed = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        let b = blurred.get_pixel(x, y).0[0];
        if (v as f32 - b as f32).abs() <= tolerance {
            Luma([b])
        } else {
            Luma([v])
        }
    });

    if sharpness <= f32::EPSILON {
        return Ok(DynamicImage::ImageLuma8(smoothed));
    }

    let background = gaussian_blur_f32(&smoothed, SMOOTHING_SIGMA);
    let restored = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let s = smoothed.get_pixel(x, y).0[0] as f32;
        let b = background.get_pixel(x, y).0[0] as f32;
        Luma([(s + sharpness * (s - b)).round().clamp(0.0, 255.0) as u8])
    });

    Ok(DynamicImage::ImageLuma8(restored))
}
