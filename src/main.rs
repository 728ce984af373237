//! text-emotions - Batch text-emotion classification service
//!
//! POST /analyse_text pulls the interviewee utterances of one interview,
//! ranks each against a multi-label emotion model, and writes the ranked
//! score maps back to the results datastore. GET /health reports liveness.

use anyhow::Result;
use std::sync::Arc;
use text_emotions::config::Settings;
use text_emotions::services::ModelCell;
use text_emotions::{build_router, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Build identification first, before any slow initialization
    info!(
        "Starting text-emotions v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let settings = Settings::load()?;
    info!("Emotion model: {}", settings.model_id);

    // Warm the model before the listener binds: no request pays the load
    // cost, and a bad artifact stops startup right here
    let models = Arc::new(ModelCell::new());
    let registry = match models.get_or_init(&settings.model_id).await {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to load emotion model: {}", e);
            return Err(e.into());
        }
    };
    info!(
        "✓ Emotion model ready: {} labels on {}",
        registry.labels().len(),
        registry.device()
    );

    let state = AppState::new(models);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    info!("text-emotions listening on http://{}", settings.bind);
    info!("Health check: http://{}/health", settings.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
