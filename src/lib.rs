//! text-emotions library interface
//!
//! Batch text-emotion classification service: pulls transcript utterances for
//! an interview, ranks each one against a multi-label emotion model, and
//! writes the ranked score maps back to the results datastore. Exposed as a
//! library for integration testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult, PipelineError, PipelineResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::services::ModelCell;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Process-wide emotion model cell, warmed before the listener binds
    pub models: Arc<ModelCell>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(models: Arc<ModelCell>) -> Self {
        Self {
            models,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyse_routes())
        .merge(api::health_routes())
        .with_state(state)
}
