//! Utterance reads and score write-backs

use crate::error::{PipelineError, PipelineResult};
use crate::models::{ResultRecord, Utterance};
use sqlx::{Row, SqlitePool};

/// Speaker discriminator marking interviewee rows
pub const INTERVIEWEE_SPEAKER: i64 = 0;

/// Fetch the interviewee utterances of one interview, in id order
pub async fn fetch_utterances(
    pool: &SqlitePool,
    interview_id: i64,
) -> PipelineResult<Vec<Utterance>> {
    let rows = sqlx::query(
        r#"
        SELECT id, text
        FROM results
        WHERE interview_id = ? AND speaker = ?
        ORDER BY id
        "#,
    )
    .bind(interview_id)
    .bind(INTERVIEWEE_SPEAKER)
    .fetch_all(pool)
    .await
    .map_err(|e| PipelineError::Connectivity(format!("utterance fetch failed: {}", e)))?;

    let mut utterances = Vec::with_capacity(rows.len());
    for row in rows {
        utterances.push(Utterance {
            id: row.get("id"),
            text: row.get("text"),
        });
    }

    Ok(utterances)
}

/// Write one ranked score map back to its utterance row
///
/// The map is stored as JSON with keys in rank order; the utterance text is
/// never part of the payload.
pub async fn update_text_emotions(pool: &SqlitePool, record: &ResultRecord) -> PipelineResult<()> {
    let payload = serde_json::to_string(&record.text_emotions).map_err(|e| {
        PipelineError::Persistence(format!("score map serialization failed: {}", e))
    })?;

    let result = sqlx::query("UPDATE results SET text_emotions = ? WHERE id = ?")
        .bind(payload)
        .bind(record.id)
        .execute(pool)
        .await
        .map_err(|e| PipelineError::Persistence(format!("text_emotions update failed: {}", e)))?;

    if result.rows_affected() == 0 {
        return Err(PipelineError::Persistence(format!(
            "no results row with id {} to update",
            record.id
        )));
    }

    Ok(())
}
