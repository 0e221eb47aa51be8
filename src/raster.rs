use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;

use crate::error::ScanError;

/// Immutable raster image passed between pipeline stages.
///
/// Pixels live behind an `Arc`, so clones share one buffer. Stages never
/// mutate an `Image`; they produce a new one.
#[derive(Debug, Clone)]
pub struct Image {
    pixels: Arc<DynamicImage>,
}

impl Image {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    /// Decode an encoded image (PNG, JPEG, ...) held in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ScanError> {
        let decoded = image::load_from_memory(data)
            .map_err(|e| ScanError::UnsupportedFormat(format!("Failed to decode image: {}", e)))?;
        Ok(Self::new(decoded))
    }

    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let decoded = image::open(path)
            .map_err(|e| ScanError::ProcessingError(format!("Failed to load image: {}", e)))?;
        Ok(Self::new(decoded))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.pixels
    }

    /// True when both images hold the same pixel buffer.
    pub fn shares_buffer(&self, other: &Image) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }

    /// Pixel-level equality, regardless of buffer identity.
    pub fn same_pixels(&self, other: &Image) -> bool {
        self.shares_buffer(other)
            || (self.dimensions() == other.dimensions()
                && self.pixels.color() == other.pixels.color()
                && self.pixels.as_bytes() == other.pixels.as_bytes())
    }
}

impl From<DynamicImage> for Image {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}
