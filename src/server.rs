use crate::config::Config;
use crate::engines::{EngineInfo, EngineRegistry};
use crate::error::ScanError;
use crate::geometry::Rect;
use crate::layout::{StructuredDocument, TextFragment, TextLine, TextParagraph};
use crate::preprocessing::StageRecord;
use crate::raster::Image;
use crate::scanner::{BoardScanner, ScanReport};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scanner: Arc<BoardScanner>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(scanner: BoardScanner, config: Config) -> Self {
        Self {
            scanner: Arc::new(scanner),
            config: Arc::new(config),
        }
    }
}

/// One line of a structured document
#[derive(Debug, Serialize, Deserialize)]
pub struct LineView {
    pub text: String,
    pub confidence: f32,
    pub bounding_box: Option<Rect>,
}

/// One paragraph of a structured document
#[derive(Debug, Serialize, Deserialize)]
pub struct ParagraphView {
    pub text: String,
    pub confidence: f32,
    pub bounding_box: Option<Rect>,
    pub lines: Vec<LineView>,
}

/// Structured text as returned over HTTP
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentView {
    /// Paragraphs separated by blank lines
    pub text: String,
    pub confidence: f32,
    pub word_count: usize,
    pub estimated_reading_seconds: f32,
    pub fragment_count: usize,
    pub paragraphs: Vec<ParagraphView>,
}

impl From<&TextLine> for LineView {
    fn from(line: &TextLine) -> Self {
        Self {
            text: line.text(),
            confidence: line.confidence(),
            bounding_box: line.bounding_box(),
        }
    }
}

impl From<&TextParagraph> for ParagraphView {
    fn from(paragraph: &TextParagraph) -> Self {
        Self {
            text: paragraph.text(),
            confidence: paragraph.confidence(),
            bounding_box: paragraph.bounding_box(),
            lines: paragraph.lines().iter().map(LineView::from).collect(),
        }
    }
}

impl From<&StructuredDocument> for DocumentView {
    fn from(doc: &StructuredDocument) -> Self {
        Self {
            text: doc.formatted_text(),
            confidence: doc.overall_confidence(),
            word_count: doc.word_count,
            estimated_reading_seconds: doc.estimated_reading_seconds,
            fragment_count: doc.source.fragments.len(),
            paragraphs: doc.paragraphs.iter().map(ParagraphView::from).collect(),
        }
    }
}

/// Scan response
#[derive(Serialize)]
pub struct ScanResponse {
    pub engine: String,
    pub language: String,
    pub document: DocumentView,
    pub stages: Vec<StageRecord>,
    pub enhanced_width: u32,
    pub enhanced_height: u32,
    pub pipeline_time_ms: u64,
    pub processing_time_ms: u64,
}

/// Structure request: fragments from any recognizer
#[derive(Deserialize)]
pub struct StructureRequest {
    pub fragments: Vec<TextFragment>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub engine: EngineInfo,
    pub supported_formats: Vec<String>,
    pub pipeline_stages: Vec<String>,
    pub rectify_mode: String,
    pub max_file_size_bytes: usize,
    pub default_language: String,
}

/// Routes with all layers applied
pub fn router(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .route("/scan", post(handle_scan))
        .route("/structure", post(handle_structure))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let registry = EngineRegistry::new(&config)?;
    let recognizer = registry
        .default()
        .ok_or_else(|| ScanError::InitializationError("No default engine".to_string()))?;
    tracing::info!(
        "Engines available: {:?}, using '{}'",
        registry.list(),
        registry.default_name()
    );

    let scanner = BoardScanner::standard(recognizer, config.rectify_mode);
    let addr = format!("{}:{}", config.host, config.port);
    let app = router(AppState::new(scanner, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Handle scan requests: enhance, recognize and structure one photo
async fn handle_scan(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ScanResponse>, ScanError> {
    let start = Instant::now();

    let mut file_data: Option<Bytes> = None;
    let mut language: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ScanError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            "file" => {
                file_data = Some(field.bytes().await.map_err(|e| {
                    ScanError::InvalidRequest(format!("Failed to read file data: {}", e))
                })?);
            }
            "language" | "languages" => {
                let value = field.text().await.map_err(|e| {
                    ScanError::InvalidRequest(format!("Invalid language: {}", e))
                })?;
                // Tesseract style "eng+deu" lists select their first entry
                language = value
                    .split(['+', ','])
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(str::to_string);
            }
            _ => {
                // Ignore unknown fields
            }
        }
    }

    let data = file_data.ok_or(ScanError::MissingFile)?;

    if data.len() > state.config.max_file_size {
        return Err(ScanError::ImageTooLarge {
            size: data.len(),
            max: state.config.max_file_size,
        });
    }

    let request = state.config.recognition_request(language.as_deref());
    let recognizer = state.scanner.recognizer();
    if !recognizer.supported_languages().contains(&request.language) {
        tracing::warn!(
            "Language '{}' is not listed by engine '{}'",
            request.language,
            recognizer.name()
        );
    }
    let engine = recognizer.name().to_string();

    // Decoding and the pipeline are CPU bound
    let scanner = state.scanner.clone();
    let language = request.language.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<ScanReport, ScanError> {
        let image = Image::from_bytes(&data)?;
        Ok(scanner.scan(image, &request, |fraction| {
            tracing::debug!("Scan progress {:.0}%", fraction * 100.0)
        }))
    })
    .await
    .map_err(|e| ScanError::Internal(format!("Scan task failed: {}", e)))??;

    let processing_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Scan completed in {}ms, confidence: {:.2}, words: {}",
        processing_time_ms,
        report.document.overall_confidence(),
        report.document.word_count
    );

    Ok(Json(ScanResponse {
        engine,
        language,
        document: DocumentView::from(&report.document),
        enhanced_width: report.pipeline.enhanced_image.width(),
        enhanced_height: report.pipeline.enhanced_image.height(),
        pipeline_time_ms: report.pipeline.total_time_ms,
        stages: report.pipeline.stages,
        processing_time_ms,
    }))
}

/// Handle structure requests: layout only, no image involved
async fn handle_structure(
    State(state): State<AppState>,
    Json(request): Json<StructureRequest>,
) -> Json<DocumentView> {
    let doc = state.scanner.structure_text(&request.fragments);
    tracing::debug!(
        "Structured {} fragments into {} paragraphs",
        request.fragments.len(),
        doc.paragraphs.len()
    );
    Json(DocumentView::from(&doc))
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: EngineInfo::of(state.scanner.recognizer()),
        supported_formats: [
            "image/png",
            "image/jpeg",
            "image/gif",
            "image/bmp",
            "image/webp",
            "image/tiff",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect(),
        pipeline_stages: state
            .scanner
            .pipeline()
            .stage_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        rectify_mode: state.config.rectify_mode.as_str().to_string(),
        max_file_size_bytes: state.config.max_file_size,
        default_language: state.config.default_language.clone(),
    })
}
