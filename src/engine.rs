use crate::error::RecognitionError;
use crate::layout::TextFragment;
use crate::raster::Image;

/// Parameters for one recognition call
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    /// Tesseract style language code (e.g. "eng")
    pub language: String,
    /// Fragments shorter than this share of the image height are dropped
    pub min_text_height_fraction: f32,
}

impl Default for RecognitionRequest {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            min_text_height_fraction: 0.0,
        }
    }
}

/// Trait that all text recognition engines must implement
pub trait TextRecognizer: Send + Sync {
    /// Returns the engine identifier (e.g., "ocrs", "leptess")
    fn name(&self) -> &'static str;

    /// Returns a human-readable description of the engine
    fn description(&self) -> &'static str;

    /// Recognize text fragments with bounding boxes and confidences
    fn recognize(
        &self,
        image: &Image,
        request: &RecognitionRequest,
    ) -> Result<Vec<TextFragment>, RecognitionError>;

    /// Get supported languages
    fn supported_languages(&self) -> Vec<String>;
}

/// Drop fragments whose box is shorter than `fraction` of `image_height`.
pub fn drop_small_text(
    fragments: Vec<TextFragment>,
    image_height: u32,
    fraction: f32,
) -> Vec<TextFragment> {
    if fraction <= 0.0 || !fraction.is_finite() {
        return fragments;
    }
    let min_height = fraction * image_height as f32;
    fragments
        .into_iter()
        .filter(|f| f.bounding_box.height >= min_height)
        .collect()
}
