//! OCRS engine implementation
//!
//! Pure Rust OCR engine using the ocrs library. No system dependencies required.
//! Downloads neural network models automatically on first use.

use super::download::{cache_dir, ensure_cached};
use crate::engine::{RecognitionRequest, TextRecognizer};
use crate::error::{RecognitionError, ScanError};
use crate::geometry::Rect;
use crate::layout::TextFragment;
use crate::raster::Image;
use ocrs::{DecodeMethod, ImageSource, OcrEngine as OcrsOcrEngine, OcrEngineParams, TextItem};
use rten::Model;

/// Default model URLs from the ocrs project
const DETECTION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-detection.rten";
const RECOGNITION_MODEL_URL: &str =
    "https://ocrs-models.s3-accelerate.amazonaws.com/text-recognition.rten";

/// Text recognizer wrapping the ocrs library
pub struct OcrsEngine {
    engine: OcrsOcrEngine,
}

impl OcrsEngine {
    /// Create the engine, downloading models if needed
    pub fn new() -> Result<Self, ScanError> {
        tracing::info!("Initializing ocrs OCR engine...");

        let models = cache_dir(None)?;
        let detection_model_path =
            ensure_cached(DETECTION_MODEL_URL, &models, "text-detection.rten")?;
        let recognition_model_path =
            ensure_cached(RECOGNITION_MODEL_URL, &models, "text-recognition.rten")?;

        let detection_model = Model::load_file(&detection_model_path).map_err(|e| {
            ScanError::InitializationError(format!("Failed to load detection model: {}", e))
        })?;
        let recognition_model = Model::load_file(&recognition_model_path).map_err(|e| {
            ScanError::InitializationError(format!("Failed to load recognition model: {}", e))
        })?;

        let engine = OcrsOcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            decode_method: DecodeMethod::Greedy,
            ..Default::default()
        })
        .map_err(|e| {
            ScanError::InitializationError(format!("Failed to create OCR engine: {}", e))
        })?;

        tracing::info!("ocrs engine initialized successfully");

        Ok(Self { engine })
    }
}

impl TextRecognizer for OcrsEngine {
    fn name(&self) -> &'static str {
        "ocrs"
    }

    fn description(&self) -> &'static str {
        "Pure Rust OCR engine - fast, no system dependencies required"
    }

    fn recognize(
        &self,
        image: &Image,
        request: &RecognitionRequest,
    ) -> Result<Vec<TextFragment>, RecognitionError> {
        if request.language != "eng" {
            tracing::warn!(
                "ocrs only recognizes Latin script, ignoring language '{}'",
                request.language
            );
        }

        // HWC layout, which is what ImageSource::from_bytes expects
        let rgb_img = image.as_dynamic().to_rgb8();
        let dimensions = rgb_img.dimensions();

        let img_source = ImageSource::from_bytes(rgb_img.as_raw(), dimensions).map_err(|e| {
            RecognitionError::Engine(format!("Failed to create image source: {}", e))
        })?;

        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| RecognitionError::Engine(format!("Failed to prepare input: {}", e)))?;

        let word_rects = self
            .engine
            .detect_words(&ocr_input)
            .map_err(|e| RecognitionError::Engine(format!("Failed to detect words: {}", e)))?;

        let line_rects = self.engine.find_text_lines(&ocr_input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&ocr_input, &line_rects)
            .map_err(|e| RecognitionError::Engine(format!("Failed to recognize text: {}", e)))?;

        let mut fragments = Vec::new();
        for line in line_texts.iter().flatten() {
            // ocrs has no scores, every word inherits its line's text quality
            let line_text = line
                .words()
                .map(|word| word.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let confidence = text_quality(&line_text);

            for word in line.words() {
                let text = word.to_string();
                if text.trim().is_empty() {
                    continue;
                }
                let rect = word.bounding_rect();
                let bbox = Rect::new(
                    rect.left() as f32,
                    rect.top() as f32,
                    rect.width() as f32,
                    rect.height() as f32,
                );
                fragments.push(TextFragment::new(text, confidence, bbox));
            }
        }

        tracing::debug!("ocrs recognized {} words", fragments.len());
        Ok(fragments)
    }

    fn supported_languages(&self) -> Vec<String> {
        // ocrs currently only supports English/Latin alphabet
        vec!["eng".to_string()]
    }
}

// ============================================================================
// Confidence scoring heuristics
// ============================================================================

/// Score recognized text by how little it looks like OCR garbage.
fn text_quality(text: &str) -> f32 {
    if text.trim().is_empty() {
        return 0.0;
    }
    if text.len() < 5 {
        return 0.5; // Too short to judge accurately
    }

    let score = 0.40 * char_mix_score(text)
        + 0.30 * word_length_score(text)
        + 0.15 * spacing_score(text)
        + 0.15 * run_length_score(text);

    score.clamp(0.0, 1.0)
}

/// Penalizes symbol soup and text with few letters.
fn char_mix_score(text: &str) -> f32 {
    let total = text.chars().count() as f32;
    let letters = text.chars().filter(|c| c.is_alphabetic()).count() as f32;
    let symbols = text
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace() && !c.is_ascii_punctuation())
        .count() as f32;

    let symbol_penalty = 1.0 - (symbols / total * 10.0).min(1.0);
    let letter_score = (letters / total * 1.5).min(1.0);

    symbol_penalty * 0.6 + letter_score * 0.4
}

/// Garbled OCR tends to produce one-char "words" or endless runs.
fn word_length_score(text: &str) -> f32 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.5;
    }

    let avg_len = words.iter().map(|w| w.len()).sum::<usize>() / words.len();
    let avg_score = match avg_len {
        0..=1 => 0.3,
        2..=3 => 0.7,
        4..=8 => 1.0,
        9..=12 => 0.8,
        _ => 0.4,
    };

    let singles = words.iter().filter(|w| w.len() == 1).count() as f32 / words.len() as f32;
    avg_score * (1.0 - (singles * 1.5).min(0.5))
}

/// Board text reads best with 10-25% whitespace.
fn spacing_score(text: &str) -> f32 {
    let total = text.chars().count();
    let spaces = text.chars().filter(|c| c.is_whitespace()).count();

    match spaces * 100 / total {
        0..=5 => 0.5,
        6..=10 => 0.8,
        11..=25 => 1.0,
        26..=40 => 0.7,
        _ => 0.3,
    }
}

/// Long runs like "aaaa" or "####" often indicate OCR confusion.
fn run_length_score(text: &str) -> f32 {
    let mut longest = 1;
    let mut run = 1;
    let mut prev: Option<char> = None;

    for c in text.chars() {
        if Some(c) == prev && !c.is_whitespace() {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 1;
        }
        prev = Some(c);
    }

    match longest {
        1..=3 => 1.0,
        4..=5 => 0.8,
        6..=10 => 0.5,
        _ => 0.2,
    }
}
