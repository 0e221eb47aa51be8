use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use serde_json::Value;
use std::io::Cursor;
use std::sync::Arc;
use tower::ServiceExt;
use whiteboard_ocr::geometry::Rect;
use whiteboard_ocr::layout::{structure, TextFragment};
use whiteboard_ocr::preprocessing::{FnStage, Pipeline, RectifyMode, Stage, StageStatus};
use whiteboard_ocr::server::{router, AppState};
use whiteboard_ocr::{
    BoardScanner, Config, Image, RecognitionError, RecognitionRequest, StageError, TextRecognizer,
};

const BOUNDARY: &str = "XBOUNDARYX";

/// Recognizer returning the same two lines for every image
struct CannedRecognizer;

impl TextRecognizer for CannedRecognizer {
    fn name(&self) -> &'static str {
        "canned"
    }

    fn description(&self) -> &'static str {
        "fixed fragments for tests"
    }

    fn recognize(
        &self,
        _image: &Image,
        _request: &RecognitionRequest,
    ) -> Result<Vec<TextFragment>, RecognitionError> {
        Ok(vec![
            TextFragment::new("standup", 0.9, Rect::new(120.0, 20.0, 70.0, 18.0)),
            TextFragment::new("Daily", 0.8, Rect::new(20.0, 22.0, 60.0, 18.0)),
            TextFragment::new("notes", 0.7, Rect::new(20.0, 110.0, 60.0, 18.0)),
        ])
    }

    fn supported_languages(&self) -> Vec<String> {
        vec!["eng".to_string()]
    }
}

struct SilentRecognizer;

impl TextRecognizer for SilentRecognizer {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn description(&self) -> &'static str {
        "never finds text"
    }

    fn recognize(
        &self,
        _image: &Image,
        _request: &RecognitionRequest,
    ) -> Result<Vec<TextFragment>, RecognitionError> {
        Ok(Vec::new())
    }

    fn supported_languages(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Bright board with dark strokes on a dark wall
fn board_photo() -> DynamicImage {
    let img = GrayImage::from_fn(240, 180, |x, y| {
        let on_board = (30..210).contains(&x) && (25..155).contains(&y);
        let stroke = (70..170).contains(&x) && (y == 70 || y == 71 || y == 110 || y == 111);
        match (on_board, stroke) {
            (true, true) => Luma([40]),
            (true, false) => Luma([230]),
            _ => Luma([25]),
        }
    });
    DynamicImage::ImageLuma8(img)
}

/// Board photographed from below: the top edge is shorter than the bottom
fn keystoned_board_photo() -> DynamicImage {
    let img = GrayImage::from_fn(240, 180, |x, y| {
        let (x, y) = (x as f32, y as f32);
        let t = (y - 30.0) / 120.0;
        let on_board = (0.0..=1.0).contains(&t) && x >= 60.0 - 30.0 * t && x <= 180.0 + 30.0 * t;
        if on_board {
            Luma([230])
        } else {
            Luma([25])
        }
    });
    DynamicImage::ImageLuma8(img)
}

fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn standard_scanner(recognizer: Arc<dyn TextRecognizer>) -> BoardScanner {
    BoardScanner::standard(recognizer, RectifyMode::Corners)
}

fn failing_stage(name: &str) -> Box<dyn Stage> {
    let label = name.to_string();
    Box::new(FnStage::new(name, move |_| {
        Err(StageError::stage(&label, "unavailable"))
    }))
}

fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(file) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: image/png\r\n\r\n",
                    name, file
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn scan_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scan")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn app_state() -> AppState {
    AppState::new(standard_scanner(Arc::new(CannedRecognizer)), Config::default())
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_all_stages_failing_returns_input_pixels() {
    let pipeline = Pipeline::new(vec![
        failing_stage("boundary"),
        failing_stage("enhance"),
        failing_stage("rectify"),
        failing_stage("text-optimize"),
    ]);
    let input = Image::new(board_photo());

    let result = pipeline.process(input.clone());

    assert!(result.enhanced_image.same_pixels(&input));
    assert_eq!(result.stages_skipped().len(), 4);
}

#[test]
fn test_standard_pipeline_on_board_photo() {
    let scanner = standard_scanner(Arc::new(SilentRecognizer));
    let input = Image::new(board_photo());
    let mut progress = Vec::new();

    let result = scanner.process_image(input.clone(), |p| progress.push(p));

    let names: Vec<&str> = result.stages.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["boundary", "enhance", "rectify", "text-optimize"]);
    assert_eq!(progress.len(), 4);
    assert_eq!(progress.last().copied(), Some(1.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    // Boundary crop removes the wall around the board
    assert_eq!(result.stages[0].status, StageStatus::Applied);
    assert!(result.enhanced_image.width() < input.width());
    assert!(result.enhanced_image.height() < input.height());
    assert!(result.original_image.same_pixels(&input));
}

#[test]
fn test_keystoned_board_is_rectified_with_corners() {
    let input = Image::new(keystoned_board_photo());

    let result = standard_scanner(Arc::new(SilentRecognizer)).process_image(input, |_| {});

    assert_eq!(result.stages[0].name, "boundary");
    assert_eq!(result.stages[0].status, StageStatus::Applied);
    assert_eq!(result.stages[2].name, "rectify");
    assert_eq!(result.stages[2].status, StageStatus::Applied);
}

#[test]
fn test_keystoned_board_in_bounding_box_mode_skips_rectify() {
    let scanner = BoardScanner::standard(Arc::new(SilentRecognizer), RectifyMode::BoundingBox);

    let result = scanner.process_image(Image::new(keystoned_board_photo()), |_| {});

    assert_eq!(result.stages[0].status, StageStatus::Applied);
    assert_eq!(result.stages_skipped(), vec!["rectify"]);
    assert!(matches!(
        &result.stages[2].status,
        StageStatus::Skipped { reason } if reason.contains("corners")
    ));
}

#[test]
fn test_uniform_photo_skips_boundary_but_enhances() {
    let scanner = standard_scanner(Arc::new(SilentRecognizer));
    let input = Image::new(DynamicImage::ImageLuma8(GrayImage::from_pixel(
        64,
        64,
        Luma([128]),
    )));

    let result = scanner.process_image(input.clone(), |_| {});

    assert_eq!(result.stages_skipped(), vec!["boundary", "rectify"]);
    assert_eq!(result.stages_applied(), vec!["enhance", "text-optimize"]);
    assert_eq!(result.enhanced_image.dimensions(), (64, 64));
}

#[test]
fn test_photo_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("board.png");
    std::fs::write(&path, png_bytes(&board_photo())).unwrap();

    let image = Image::open(&path).unwrap();
    let report = standard_scanner(Arc::new(CannedRecognizer)).scan(
        image,
        &RecognitionRequest::default(),
        |_| {},
    );

    assert_eq!(report.document.formatted_text(), "Daily standup\n\nnotes");
}

#[test]
fn test_concurrent_scans_share_one_scanner() {
    let scanner = standard_scanner(Arc::new(CannedRecognizer));
    let input = Image::new(board_photo());
    let request = RecognitionRequest::default();

    let reference = scanner.scan(input.clone(), &request, |_| {});

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| scanner.scan(input.clone(), &request, |_| {})))
            .collect();

        for handle in handles {
            let report = handle.join().unwrap();
            assert!(report
                .pipeline
                .enhanced_image
                .same_pixels(&reference.pipeline.enhanced_image));
            assert_eq!(
                report.document.formatted_text(),
                reference.document.formatted_text()
            );
        }
    });
}

// ============================================================================
// Layout
// ============================================================================

#[test]
fn test_structure_partitions_random_fragments() {
    // Small LCG so the test is deterministic without extra crates
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move |range: f32| {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        ((seed >> 33) as f32 / (1u64 << 31) as f32) * range
    };

    for round in 0..20 {
        let count = 1 + (next(40.0) as usize);
        let fragments: Vec<TextFragment> = (0..count)
            .map(|i| {
                TextFragment::new(
                    format!("w{}-{}", round, i),
                    next(1.0),
                    Rect::new(next(800.0), next(600.0), 20.0, 12.0),
                )
            })
            .collect();

        let layout = structure(&fragments);

        let mut from_lines: Vec<String> = layout
            .lines
            .iter()
            .flat_map(|l| l.fragments().iter().map(|f| f.text.clone()))
            .collect();
        let mut expected: Vec<String> = fragments.iter().map(|f| f.text.clone()).collect();
        from_lines.sort();
        expected.sort();
        assert_eq!(from_lines, expected, "every fragment in exactly one line");

        let lines_in_paragraphs: usize = layout.paragraphs.iter().map(|p| p.len()).sum();
        assert_eq!(lines_in_paragraphs, layout.lines.len());

        for paragraph in &layout.paragraphs {
            assert!(paragraph
                .lines()
                .windows(2)
                .all(|w| w[0].top() <= w[1].top()));
        }
        assert!(layout
            .paragraphs
            .windows(2)
            .all(|w| w[0].top() <= w[1].top()));

        for line in &layout.lines {
            assert!(!line.is_empty());
            assert!(line
                .fragments()
                .windows(2)
                .all(|w| w[0].left() <= w[1].left()));
        }
    }
}

#[test]
fn test_silent_recognizer_gives_empty_document() {
    let report = standard_scanner(Arc::new(SilentRecognizer)).scan(
        Image::new(board_photo()),
        &RecognitionRequest::default(),
        |_| {},
    );

    assert!(report.document.is_empty());
    assert_eq!(report.document.formatted_text(), "");
    assert_eq!(report.document.word_count, 0);
    assert_eq!(report.document.overall_confidence(), 0.0);
}

// ============================================================================
// HTTP
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app_state(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_info_endpoint() {
    let request = Request::builder().uri("/info").body(Body::empty()).unwrap();
    let (status, body) = send(app_state(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"]["name"], "canned");
    assert_eq!(body["engine"]["supported_languages"], serde_json::json!(["eng"]));
    assert_eq!(body["rectify_mode"], "corners");
    assert_eq!(
        body["pipeline_stages"],
        serde_json::json!(["boundary", "enhance", "rectify", "text-optimize"])
    );
}

#[tokio::test]
async fn test_scan_endpoint() {
    let png = png_bytes(&board_photo());
    let body = multipart_body(&[
        ("file", Some("board.png"), png.as_slice()),
        ("language", None, &b"eng"[..]),
    ]);

    let (status, body) = send(app_state(), scan_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["engine"], "canned");
    assert_eq!(body["document"]["text"], "Daily standup\n\nnotes");
    assert_eq!(body["document"]["word_count"], 3);
    assert_eq!(body["document"]["paragraphs"].as_array().unwrap().len(), 2);
    assert_eq!(body["stages"].as_array().unwrap().len(), 4);
    assert_eq!(body["stages"][0]["name"], "boundary");
}

#[tokio::test]
async fn test_scan_without_file() {
    let body = multipart_body(&[("language", None, &b"eng"[..])]);

    let (status, body) = send(app_state(), scan_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FILE");
}

#[tokio::test]
async fn test_scan_rejects_undecodable_file() {
    let body = multipart_body(&[("file", Some("board.png"), &b"definitely not a png"[..])]);

    let (status, body) = send(app_state(), scan_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_FORMAT");
}

#[tokio::test]
async fn test_structure_endpoint() {
    let fragments = serde_json::json!({
        "fragments": [
            {"text": "b", "confidence": 0.5, "bounding_box": {"x": 60.0, "y": 100.0, "width": 20.0, "height": 10.0}, "estimated_font_size": 10.0},
            {"text": "a", "confidence": 1.0, "bounding_box": {"x": 0.0, "y": 105.0, "width": 20.0, "height": 10.0}, "estimated_font_size": 10.0},
            {"text": "c", "confidence": 0.0, "bounding_box": {"x": 0.0, "y": 200.0, "width": 20.0, "height": 10.0}, "estimated_font_size": 10.0}
        ]
    });
    let request = Request::builder()
        .method("POST")
        .uri("/structure")
        .header("content-type", "application/json")
        .body(Body::from(fragments.to_string()))
        .unwrap();

    let (status, body) = send(app_state(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "a b\n\nc");
    assert_eq!(body["fragment_count"], 3);
    assert_eq!(body["paragraphs"][0]["lines"][0]["text"], "a b");
}
