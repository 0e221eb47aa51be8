use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single pipeline stage or filter.
///
/// Never surfaces past the orchestrator: a failing stage is replaced by its
/// own input and recorded as skipped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error("Stage '{stage}' failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error("Filter '{filter}' failed: {reason}")]
    FilterFailed { filter: String, reason: String },

    #[error("No board boundary found")]
    BoundaryNotFound,

    #[error("No boundary corners available for rectification")]
    MissingCorners,
}

impl StageError {
    pub fn filter(filter: &str, reason: impl Into<String>) -> Self {
        Self::FilterFailed {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn stage(stage: &str, reason: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of the external text recognition capability.
///
/// Callers turn this into an empty document rather than an error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("Recognition unavailable: {0}")]
    Unavailable(String),

    #[error("Recognition engine error: {0}")]
    Engine(String),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to initialize OCR engine: {0}")]
    InitializationError(String),

    #[error("Failed to process image: {0}")]
    ProcessingError(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ScanError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ScanError::InitializationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INIT_ERROR"),
            ScanError::ProcessingError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PROCESSING_ERROR"),
            ScanError::UnsupportedFormat(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
            ScanError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            ScanError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            ScanError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ScanError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
