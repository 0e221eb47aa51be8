use super::steps;
use crate::error::StageError;
use crate::geometry::{Quadrilateral, Rect};
use crate::raster::Image;

/// A named enhancement filter with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Histogram stretch to the full 0-255 range
    AutoLevel,
    Contrast { factor: f32 },
    /// Drop color, keep RGBA layout
    Desaturate,
    /// Luminance-only sharpening
    Sharpen { strength: f32 },
    /// Single-channel perceptual luminance
    Luminance,
    Denoise { noise_level: f32, sharpness: f32 },
    Crop { rect: Rect },
    /// Map the quadrilateral onto the full image rectangle
    Perspective { corners: Quadrilateral },
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AutoLevel => "auto-level",
            Self::Contrast { .. } => "contrast",
            Self::Desaturate => "desaturate",
            Self::Sharpen { .. } => "sharpen",
            Self::Luminance => "luminance",
            Self::Denoise { .. } => "denoise",
            Self::Crop { .. } => "crop",
            Self::Perspective { .. } => "perspective",
        }
    }
}

/// Capability that applies one named filter to an image.
///
/// Returning an error means the filter produced no output; the caller keeps
/// the input image.
pub trait FilterBackend: Send + Sync {
    fn apply_filter(&self, image: &Image, filter: &Filter) -> Result<Image, StageError>;
}

/// Filter backend built on the `image` and `imageproc` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageprocBackend;

impl FilterBackend for ImageprocBackend {
    fn apply_filter(&self, image: &Image, filter: &Filter) -> Result<Image, StageError> {
        if image.is_empty() {
            return Err(StageError::filter(filter.name(), "image has no pixels"));
        }

        let input = image.as_dynamic();
        let output = match filter {
            Filter::AutoLevel => steps::auto_level::apply(input)?,
            Filter::Contrast { factor } => steps::contrast::apply(input, *factor)?,
            Filter::Desaturate => steps::desaturate::apply(input)?,
            Filter::Sharpen { strength } => steps::sharpen::apply(input, *strength)?,
            Filter::Luminance => steps::luminance::apply(input)?,
            Filter::Denoise {
                noise_level,
                sharpness,
            } => steps::denoise::apply(input, *noise_level, *sharpness)?,
            Filter::Crop { rect } => steps::crop::apply(input, rect)?,
            Filter::Perspective { corners } => steps::perspective::apply(input, corners)?,
        };

        Ok(Image::new(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, RgbaImage};

    #[test]
    fn test_empty_image_fails_every_filter() {
        let empty = Image::new(DynamicImage::ImageLuma8(GrayImage::new(0, 0)));
        let result = ImageprocBackend.apply_filter(&empty, &Filter::AutoLevel);
        assert!(matches!(result, Err(StageError::FilterFailed { .. })));
    }

    #[test]
    fn test_filter_produces_new_image() {
        let img = Image::new(DynamicImage::ImageRgba8(RgbaImage::new(8, 8)));
        let out = ImageprocBackend.apply_filter(&img, &Filter::Luminance).unwrap();
        assert!(!out.shares_buffer(&img));
        assert_eq!(out.dimensions(), (8, 8));
    }
}
