//! Results datastore access

use crate::error::{PipelineError, PipelineResult};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub mod results;
pub mod schema;

pub use results::{fetch_utterances, update_text_emotions, INTERVIEWEE_SPEAKER};
pub use schema::create_results_table;

/// Open a connection pool to the results datastore
pub async fn connect(database_url: &str) -> PipelineResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|e| {
            PipelineError::Connectivity(format!("datastore connection failed: {}", e))
        })?;
    Ok(pool)
}
