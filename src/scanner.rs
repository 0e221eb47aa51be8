//! Facade joining the enhancement pipeline, text recognition and layout
//! reconstruction.

use std::sync::Arc;
use std::time::SystemTime;

use crate::detection::ContourBoundaryDetector;
use crate::engine::{drop_small_text, RecognitionRequest, TextRecognizer};
use crate::layout::{Clusterer, RecognizedDocument, StructuredDocument, TextFragment};
use crate::preprocessing::{ImageprocBackend, Pipeline, PipelineResult, RectifyMode};
use crate::raster::Image;

/// Everything one scan produced
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub pipeline: PipelineResult,
    pub document: StructuredDocument,
}

pub struct BoardScanner {
    pipeline: Pipeline,
    recognizer: Arc<dyn TextRecognizer>,
    clusterer: Clusterer,
}

impl BoardScanner {
    pub fn new(pipeline: Pipeline, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            pipeline,
            recognizer,
            clusterer: Clusterer::default(),
        }
    }

    /// Scanner over the standard four stage pipeline with the default
    /// contour detector and imageproc filters
    pub fn standard(recognizer: Arc<dyn TextRecognizer>, mode: RectifyMode) -> Self {
        let pipeline = Pipeline::standard(
            Arc::new(ContourBoundaryDetector),
            Arc::new(ImageprocBackend),
            mode,
        );
        Self::new(pipeline, recognizer)
    }

    pub fn with_clusterer(mut self, clusterer: Clusterer) -> Self {
        self.clusterer = clusterer;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn recognizer(&self) -> &dyn TextRecognizer {
        self.recognizer.as_ref()
    }

    /// Enhance a photo. Never fails; see [`Pipeline::run`].
    pub fn process_image<F>(&self, image: Image, progress: F) -> PipelineResult
    where
        F: FnMut(f32),
    {
        self.pipeline.run(image, progress)
    }

    /// Lines, paragraphs and metrics for already recognized fragments
    pub fn structure_text(&self, fragments: &[TextFragment]) -> StructuredDocument {
        let source =
            RecognizedDocument::captured(fragments.to_vec(), SystemTime::now(), &self.clusterer);
        StructuredDocument::with_clusterer(source, &self.clusterer)
    }

    /// Recognize text in `image`. A failing or silent recognizer yields an
    /// empty document instead of an error.
    pub fn recognize(&self, image: &Image, request: &RecognitionRequest) -> RecognizedDocument {
        match self.recognizer.recognize(image, request) {
            Ok(fragments) => {
                let fragments =
                    drop_small_text(fragments, image.height(), request.min_text_height_fraction);
                if fragments.is_empty() {
                    tracing::warn!("Recognizer '{}' found no text", self.recognizer.name());
                }
                RecognizedDocument::captured(fragments, SystemTime::now(), &self.clusterer)
            }
            Err(e) => {
                tracing::warn!(
                    "Recognizer '{}' failed, returning empty document: {}",
                    self.recognizer.name(),
                    e
                );
                RecognizedDocument::empty()
            }
        }
    }

    /// Enhance, recognize and structure one photo
    pub fn scan<F>(&self, image: Image, request: &RecognitionRequest, progress: F) -> ScanReport
    where
        F: FnMut(f32),
    {
        let pipeline = self.process_image(image, progress);
        let recognized = self.recognize(&pipeline.enhanced_image, request);
        let recognized = RecognizedDocument::captured(
            recognized.fragments,
            pipeline.timestamp,
            &self.clusterer,
        );
        let document = StructuredDocument::with_clusterer(recognized, &self.clusterer);

        tracing::info!(
            "Scan finished: {} words in {} paragraphs, confidence {:.2}",
            document.word_count,
            document.paragraphs.len(),
            document.overall_confidence()
        );

        ScanReport { pipeline, document }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecognitionError;
    use crate::geometry::Rect;
    use image::{DynamicImage, GrayImage, Luma};

    struct Fixed(Result<Vec<TextFragment>, RecognitionError>);

    impl TextRecognizer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn description(&self) -> &'static str {
            "returns canned fragments"
        }

        fn recognize(
            &self,
            _image: &Image,
            _request: &RecognitionRequest,
        ) -> Result<Vec<TextFragment>, RecognitionError> {
            self.0.clone()
        }

        fn supported_languages(&self) -> Vec<String> {
            vec!["eng".to_string()]
        }
    }

    fn image() -> Image {
        Image::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([200]))))
    }

    fn scanner(result: Result<Vec<TextFragment>, RecognitionError>) -> BoardScanner {
        BoardScanner::new(Pipeline::new(Vec::new()), Arc::new(Fixed(result)))
    }

    #[test]
    fn test_recognizer_error_gives_empty_document() {
        let scanner = scanner(Err(RecognitionError::Unavailable("offline".to_string())));
        let doc = scanner.recognize(&image(), &RecognitionRequest::default());

        assert!(doc.is_empty());
        assert_eq!(doc.full_text, "");
        assert_eq!(doc.overall_confidence, 0.0);
    }

    #[test]
    fn test_small_text_is_dropped() {
        let scanner = scanner(Ok(vec![
            TextFragment::new("Title", 0.9, Rect::new(0.0, 0.0, 40.0, 20.0)),
            TextFragment::new("dust", 0.2, Rect::new(0.0, 40.0, 5.0, 2.0)),
        ]));
        let request = RecognitionRequest {
            min_text_height_fraction: 0.1,
            ..RecognitionRequest::default()
        };

        let doc = scanner.recognize(&image(), &request);
        assert_eq!(doc.full_text, "Title");
    }

    #[test]
    fn test_scan_structures_fragments() {
        let scanner = scanner(Ok(vec![
            TextFragment::new("world", 0.8, Rect::new(60.0, 10.0, 30.0, 12.0)),
            TextFragment::new("hello", 0.6, Rect::new(10.0, 12.0, 30.0, 12.0)),
            TextFragment::new("later", 0.7, Rect::new(10.0, 90.0, 30.0, 12.0)),
        ]));
        let mut updates = 0;

        let report = scanner.scan(image(), &RecognitionRequest::default(), |_| updates += 1);

        assert_eq!(updates, 0);
        assert_eq!(report.document.formatted_text(), "hello world\n\nlater");
        assert_eq!(report.document.word_count, 3);
        assert_eq!(report.document.source.captured_at, report.pipeline.timestamp);
    }

    #[test]
    fn test_custom_clusterer_drives_source_text() {
        let fragments = vec![
            TextFragment::new("a", 0.5, Rect::new(0.0, 0.0, 10.0, 6.0)),
            TextFragment::new("b", 0.5, Rect::new(40.0, 8.0, 10.0, 6.0)),
        ];
        let scanner = scanner(Ok(fragments.clone())).with_clusterer(Clusterer::new(5.0, 100.0));

        let doc = scanner.structure_text(&fragments);
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.source.full_text, "a\nb");
        assert_eq!(doc.formatted_text(), "a\nb");

        let report = scanner.scan(image(), &RecognitionRequest::default(), |_| {});
        assert_eq!(report.document.source.full_text, "a\nb");
        assert_eq!(report.document.lines.len(), 2);
    }

    #[test]
    fn test_structure_text_matches_scan_layout() {
        let scanner = scanner(Ok(Vec::new()));
        let doc = scanner.structure_text(&[
            TextFragment::new("b", 0.5, Rect::new(50.0, 0.0, 10.0, 10.0)),
            TextFragment::new("a", 0.5, Rect::new(0.0, 5.0, 10.0, 10.0)),
        ]);

        assert_eq!(doc.lines.len(), 1);
        assert_eq!(doc.formatted_text(), "a b");
    }
}
