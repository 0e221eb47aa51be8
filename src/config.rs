use crate::engine::RecognitionRequest;
use crate::preprocessing::RectifyMode;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "whiteboard-ocr-server")]
#[command(about = "Board photo enhancement and OCR layout server")]
#[command(version)]
pub struct Args {
    /// Host address to bind to
    #[arg(long, env = "OCR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "OCR_PORT", default_value = "9292")]
    pub port: u16,

    /// Default language for OCR (e.g., "eng", "deu", "fra")
    #[arg(long, env = "OCR_DEFAULT_LANGUAGE", default_value = "eng")]
    pub default_language: String,

    /// Maximum file size in bytes (default: 50MB)
    #[arg(long, env = "OCR_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Drop recognized text shorter than this share of the image height
    #[arg(long, env = "OCR_MIN_TEXT_HEIGHT", default_value = "0.0")]
    pub min_text_height: f32,

    /// How board corners reach the rectify stage ("corners" or "bounding-box")
    #[arg(long, env = "OCR_RECTIFY_MODE", default_value = "corners", value_parser = parse_rectify_mode)]
    pub rectify_mode: RectifyMode,

    /// Path to tessdata directory (uses TESSDATA_PREFIX env var if not set)
    #[arg(long, env = "TESSDATA_PREFIX")]
    pub tessdata_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

fn parse_rectify_mode(s: &str) -> Result<RectifyMode, String> {
    RectifyMode::from_str(s)
        .ok_or_else(|| format!("unknown rectify mode '{}', expected corners or bounding-box", s))
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: String,
    pub max_file_size: usize,
    pub min_text_height: f32,
    pub rectify_mode: RectifyMode,
    pub tessdata_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            default_language: "eng".to_string(),
            max_file_size: 52_428_800,
            min_text_height: 0.0,
            rectify_mode: RectifyMode::default(),
            tessdata_path: None,
        }
    }
}

impl Config {
    /// Recognition request for `language`, or the default language
    pub fn recognition_request(&self, language: Option<&str>) -> RecognitionRequest {
        RecognitionRequest {
            language: language.unwrap_or(&self.default_language).to_string(),
            min_text_height_fraction: self.min_text_height,
        }
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            default_language: args.default_language,
            max_file_size: args.max_file_size,
            min_text_height: args.min_text_height,
            rectify_mode: args.rectify_mode,
            tessdata_path: args.tessdata_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let config = Config::from(Args::parse_from(["whiteboard-ocr-server"]));

        assert_eq!(config.port, 9292);
        assert_eq!(config.rectify_mode, RectifyMode::Corners);
        assert_eq!(config.min_text_height, 0.0);
    }

    #[test]
    fn test_rectify_mode_flag() {
        let args = Args::parse_from(["whiteboard-ocr-server", "--rectify-mode", "bounding-box"]);
        assert_eq!(args.rectify_mode, RectifyMode::BoundingBox);

        assert!(Args::try_parse_from(["whiteboard-ocr-server", "--rectify-mode", "skew"]).is_err());
    }

    #[test]
    fn test_recognition_request_falls_back_to_default_language() {
        let config = Config {
            default_language: "deu".to_string(),
            min_text_height: 0.02,
            ..Config::default()
        };

        assert_eq!(config.recognition_request(None).language, "deu");
        assert_eq!(config.recognition_request(Some("fra")).language, "fra");
        assert_eq!(config.recognition_request(None).min_text_height_fraction, 0.02);
    }
}
