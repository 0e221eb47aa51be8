//! Leptess/Tesseract engine implementation
//!
//! Tesseract-based OCR engine. Better for noisy/messy images like phone photos.
//! Uses tesseract-static crate for static linking (no system dependencies).
//! Downloads tessdata (training data) automatically on first use.

use super::download::{cache_dir, ensure_cached};
use crate::config::Config;
use crate::engine::{RecognitionRequest, TextRecognizer};
use crate::error::{RecognitionError, ScanError};
use crate::geometry::Rect;
use crate::layout::TextFragment;
use crate::raster::Image;
use std::path::PathBuf;
use tesseract_static::tesseract::Tesseract;

/// TSV level of a single word row
const TSV_WORD_LEVEL: &str = "5";
/// Columns of a TSV row: level, page, block, par, line, word, left, top,
/// width, height, conf, text
const TSV_COLUMNS: usize = 12;

/// Where traineddata files come from
#[derive(Debug, Clone)]
enum Tessdata {
    /// User supplied directory, used as is
    Fixed(String),
    /// Cache directory, missing languages are downloaded on demand
    Cached(PathBuf),
}

/// Tesseract text recognizer
pub struct LeptessEngine {
    tessdata: Tessdata,
}

impl LeptessEngine {
    /// Create a new Tesseract-based engine
    pub fn new(config: &Config) -> Result<Self, ScanError> {
        let tessdata = match &config.tessdata_path {
            Some(path) => Tessdata::Fixed(path.clone()),
            None => Tessdata::Cached(cache_dir(Some("tessdata"))?),
        };
        let engine = Self { tessdata };

        // Validate that tessdata is accessible by doing a test initialization
        let path = engine
            .tessdata_dir(&config.default_language)
            .map_err(|e| ScanError::InitializationError(e.to_string()))?;
        Tesseract::new(Some(&path), Some(&config.default_language)).map_err(|e| {
            ScanError::InitializationError(format!("Failed to initialize Tesseract: {}", e))
        })?;

        tracing::info!(
            "Leptess engine initialized (tessdata: {}, language: {})",
            path,
            config.default_language
        );

        Ok(engine)
    }

    /// Directory holding `language`'s traineddata, downloading it if needed
    fn tessdata_dir(&self, language: &str) -> Result<String, RecognitionError> {
        match &self.tessdata {
            Tessdata::Fixed(path) => Ok(path.clone()),
            Tessdata::Cached(dir) => {
                let filename = format!("{}.traineddata", language);
                ensure_cached(&tessdata_url(language), dir, &filename)
                    .map_err(|e| RecognitionError::Unavailable(e.to_string()))?;
                // Tesseract expects the directory, not the file
                dir.to_str().map(str::to_string).ok_or_else(|| {
                    RecognitionError::Unavailable("Invalid tessdata path".to_string())
                })
            }
        }
    }
}

impl TextRecognizer for LeptessEngine {
    fn name(&self) -> &'static str {
        "leptess"
    }

    fn description(&self) -> &'static str {
        "Tesseract OCR engine - better for noisy/messy images like phone photos"
    }

    fn recognize(
        &self,
        image: &Image,
        request: &RecognitionRequest,
    ) -> Result<Vec<TextFragment>, RecognitionError> {
        let rgb_img = image.as_dynamic().to_rgb8();
        let (width, height) = rgb_img.dimensions();

        // BMP is always supported by leptonica
        let mut bmp_data = Vec::new();
        rgb_img
            .write_to(&mut std::io::Cursor::new(&mut bmp_data), image::ImageFormat::Bmp)
            .map_err(|e| RecognitionError::Engine(format!("Failed to convert to BMP: {}", e)))?;

        tracing::debug!(
            "Recognizing {}x{} image, BMP size: {} bytes",
            width,
            height,
            bmp_data.len()
        );

        let tessdata = self.tessdata_dir(&request.language)?;
        let mut tess = Tesseract::new(Some(&tessdata), Some(&request.language)).map_err(|e| {
            RecognitionError::Unavailable(format!(
                "Failed to create Tesseract for '{}': {}",
                request.language, e
            ))
        })?;

        tess = tess
            .set_image_from_mem(&bmp_data)
            .map_err(|e| RecognitionError::Engine(format!("Failed to set image: {}", e)))?;
        tess = tess
            .recognize()
            .map_err(|e| RecognitionError::Engine(format!("Failed to recognize text: {}", e)))?;

        let tsv = tess
            .get_tsv_text(0)
            .map_err(|e| RecognitionError::Engine(format!("Failed to get TSV output: {}", e)))?;

        let fragments = parse_tsv_words(&tsv);
        tracing::debug!("Tesseract recognized {} words", fragments.len());
        Ok(fragments)
    }

    fn supported_languages(&self) -> Vec<String> {
        // Tesseract supports many languages - return common ones
        [
            "eng", "deu", "fra", "spa", "ita", "por", "nld", "jpn", "chi_sim", "chi_tra", "kor",
            "ara", "rus",
        ]
        .iter()
        .map(|l| l.to_string())
        .collect()
    }
}

/// Word rows of Tesseract's TSV output as fragments. Confidence comes in
/// 0-100 and is scaled to 0-1; rows without text are skipped.
fn parse_tsv_words(tsv: &str) -> Vec<TextFragment> {
    tsv.lines()
        .filter_map(|row| {
            let cols: Vec<&str> = row.splitn(TSV_COLUMNS, '\t').collect();
            if cols.len() != TSV_COLUMNS || cols[0] != TSV_WORD_LEVEL {
                return None;
            }
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }

            let num = |i: usize| cols[i].trim().parse::<f32>().ok();
            let bbox = Rect::new(num(6)?, num(7)?, num(8)?, num(9)?);
            let confidence = num(10)? / 100.0;

            Some(TextFragment::new(text, confidence, bbox))
        })
        .collect()
}

/// Get tessdata download URL for a language
fn tessdata_url(language: &str) -> String {
    // Use tessdata_fast for smaller, faster downloads
    format!(
        "https://github.com/tesseract-ocr/tessdata_fast/raw/main/{}.traineddata",
        language
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t
4\t1\t1\t1\t1\t0\t40\t30\t200\t32\t-1\t
5\t1\t1\t1\t1\t1\t40\t30\t90\t32\t91.5\tAgenda
5\t1\t1\t1\t1\t2\t140\t31\t100\t30\t75\ttoday
5\t1\t1\t1\t1\t3\t250\t31\t10\t30\t-1\t ";

    #[test]
    fn test_parse_tsv_words() {
        let words = parse_tsv_words(SAMPLE_TSV);

        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Agenda");
        assert_eq!(words[0].bounding_box, Rect::new(40.0, 30.0, 90.0, 32.0));
        assert!((words[0].confidence - 0.915).abs() < 1e-6);
        assert_eq!(words[1].text, "today");
        assert!((words[1].confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_parse_tsv_ignores_malformed_rows() {
        let words = parse_tsv_words("5\t1\t1\nnot a row\n5\t1\t1\t1\t1\t1\tx\t0\t1\t1\t90\tword");
        assert!(words.is_empty());
    }

    #[test]
    fn test_tessdata_url() {
        assert!(tessdata_url("deu").ends_with("/deu.traineddata"));
    }
}
