//! Results table schema

use crate::error::{PipelineError, PipelineResult};
use sqlx::SqlitePool;

/// Create the results table if it does not exist
///
/// One row per transcript utterance; `text_emotions` stays NULL until the
/// pipeline writes the ranked score map.
pub async fn create_results_table(pool: &SqlitePool) -> PipelineResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            id INTEGER PRIMARY KEY,
            interview_id INTEGER NOT NULL,
            speaker INTEGER NOT NULL DEFAULT 0,
            text TEXT NOT NULL DEFAULT '',
            text_emotions TEXT
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| PipelineError::Persistence(format!("results table creation failed: {}", e)))?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_results_interview_speaker ON results (interview_id, speaker)",
    )
    .execute(pool)
    .await
    .map_err(|e| PipelineError::Persistence(format!("results index creation failed: {}", e)))?;

    Ok(())
}
