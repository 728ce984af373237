//! Text emotion analysis endpoint

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db;
use crate::error::{ApiResult, PipelineError, PipelineResult};
use crate::models::ResultRecord;
use crate::services::{BatchProcessor, EmotionClassifier, Session};
use crate::AppState;

/// Query parameters identifying one pipeline invocation
#[derive(Debug, Deserialize)]
pub struct AnalyseParams {
    pub session_id: i64,
    pub interview_id: i64,
}

/// Analysis response, `status: "ok"` on success
#[derive(Debug, Serialize)]
pub struct AnalyseResponse {
    pub status: String,
}

/// POST /analyse_text?session_id=..&interview_id=..
///
/// Runs the full pipeline for one interview: fetch the interviewee
/// utterances, classify each one, write the ranked score maps back. The
/// session is ended on every path, so its log is flushed whether the
/// pipeline succeeded or failed.
pub async fn analyse_text(
    State(state): State<AppState>,
    Query(params): Query<AnalyseParams>,
) -> ApiResult<Json<AnalyseResponse>> {
    tracing::info!(
        session_id = params.session_id,
        interview_id = params.interview_id,
        "Received text analysis request"
    );

    let session = Session::begin(params.session_id, params.interview_id).await?;
    let outcome = run_pipeline(&state, &session).await;
    session.end().await;
    outcome?;

    Ok(Json(AnalyseResponse {
        status: "ok".to_string(),
    }))
}

/// Pipeline body, split out so the caller can end the session on every path
async fn run_pipeline(state: &AppState, session: &Session) -> PipelineResult<()> {
    let registry = state
        .models
        .get()
        .ok_or_else(|| PipelineError::Configuration("emotion model not initialized".to_string()))?;

    let utterances = db::fetch_utterances(session.pool(), session.interview_id()).await?;
    let ids: Vec<i64> = utterances.iter().map(|u| u.id).collect();

    // Classification is compute-bound; keep it off the async workers
    let classifier = EmotionClassifier::new(registry);
    let logger = session.logger().clone();
    let score_maps = tokio::task::spawn_blocking(move || {
        BatchProcessor::new(classifier).process(&utterances, &logger)
    })
    .await
    .map_err(|e| PipelineError::Inference(format!("classification task panicked: {}", e)))??;

    for (id, text_emotions) in ids.into_iter().zip(score_maps) {
        let record = ResultRecord { id, text_emotions };
        if let Err(e) = db::update_text_emotions(session.pool(), &record).await {
            session
                .logger()
                .error("Error updating the results from text in the database");
            return Err(e);
        }
    }
    session
        .logger()
        .info("Results from text updated in the database");

    Ok(())
}

/// Build analysis routes
pub fn analyse_routes() -> Router<AppState> {
    Router::new().route("/analyse_text", post(analyse_text))
}
