//! Error types for text-emotions
//!
//! Invocation-level failures are categorized so callers can tell a broken
//! deployment (configuration, connectivity) from a failed batch (inference,
//! persistence). Log upload failures are recorded but never propagated.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Pipeline error taxonomy
///
/// Variants carry plain messages rather than wrapped source errors because a
/// single source type (sqlx, reqwest) maps to different categories depending
/// on where it occurs: a failed connect is connectivity, a failed UPDATE is
/// persistence.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required settings or model artifacts missing; fatal to the invocation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Datastore or blob storage unreachable; fatal to the invocation
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Classification failed for an item; aborts the whole batch
    #[error("Inference error: {0}")]
    Inference(String),

    /// Write-back to the datastore failed; the session is still logged and ended
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Best-effort log flush failed; recorded, never propagated to the caller
    #[error("Log upload error: {0}")]
    LogUpload(String),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// API error wrapper mapping pipeline failures onto HTTP responses
///
/// Every invocation-level failure surfaces to the caller as one JSON error
/// with a category code and a descriptive message.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match self.0 {
            PipelineError::Configuration(_) => "CONFIGURATION_ERROR",
            PipelineError::Connectivity(_) => "CONNECTIVITY_ERROR",
            PipelineError::Inference(_) => "INFERENCE_ERROR",
            PipelineError::Persistence(_) => "PERSISTENCE_ERROR",
            PipelineError::LogUpload(_) => "LOG_UPLOAD_ERROR",
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.0.to_string(),
            }
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
