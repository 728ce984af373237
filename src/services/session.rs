//! Per-invocation resource session
//!
//! One `Session` is created per pipeline run: configuration, datastore pool,
//! storage client, and the session log buffer. Connectivity is verified at
//! construction so a broken dependency fails the request up front instead of
//! midway through a batch.
//!
//! `end` consumes the session, which makes ending it twice a compile error
//! rather than a runtime hazard. Teardown uploads the buffered log as one
//! plain-text object; an upload failure is recorded and swallowed so it can
//! never mask the pipeline outcome. The shared model registry has its own
//! process-wide lifecycle and is not part of this struct.

use crate::config::Settings;
use crate::db;
use crate::error::PipelineResult;
use crate::services::log_buffer::SessionLogger;
use crate::services::storage::StorageClient;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Object key prefix for uploaded session logs
const LOG_PREFIX: &str = "logs";
/// Timestamp layout embedded in the log object filename
const LOG_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H.%M.%S";

pub struct Session {
    session_id: i64,
    interview_id: i64,
    settings: Settings,
    pool: SqlitePool,
    storage: StorageClient,
    logger: SessionLogger,
    started_at: DateTime<Utc>,
    ended: bool,
}

impl Session {
    /// Open a session: load configuration, connect the datastore, and probe
    /// the storage bucket
    ///
    /// Failures here are typed and recoverable; one rejected request must not
    /// take the server process down.
    pub async fn begin(session_id: i64, interview_id: i64) -> PipelineResult<Self> {
        let settings = Settings::load()?;
        let storage_key = Settings::storage_key()?;
        Self::begin_with_settings(session_id, interview_id, settings, &storage_key).await
    }

    /// Open a session from already-resolved settings and storage credential
    pub async fn begin_with_settings(
        session_id: i64,
        interview_id: i64,
        settings: Settings,
        storage_key: &str,
    ) -> PipelineResult<Self> {
        let pool = db::connect(&settings.database_url).await?;
        let storage =
            StorageClient::connect(&settings.storage.url, &settings.storage.bucket, storage_key)
                .await?;

        let logger = SessionLogger::new(session_id, interview_id);
        logger.info(format!(
            "Connection to storage bucket {} successful",
            settings.storage.bucket
        ));

        Ok(Self {
            session_id,
            interview_id,
            settings,
            pool,
            storage,
            logger,
            started_at: Utc::now(),
            ended: false,
        })
    }

    pub fn session_id(&self) -> i64 {
        self.session_id
    }

    pub fn interview_id(&self) -> i64 {
        self.interview_id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    /// Close the session: flush the log buffer, upload it, release resources
    ///
    /// Consumes the session, so a second call cannot compile. The upload is
    /// best-effort: a failure is logged and dropped, never returned.
    pub async fn end(mut self) {
        self.ended = true;

        let content = self.logger.buffer().flush();
        if content.is_empty() {
            tracing::debug!(session_id = self.session_id, "No session log lines to upload");
        } else {
            let path = log_object_path(&self.started_at);
            if let Err(e) = self.storage.upload_text(&path, content).await {
                tracing::error!(session_id = self.session_id, "{}", e);
            }
        }

        self.pool.close().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("interview_id", &self.interview_id)
            .field("started_at", &self.started_at)
            .field("ended", &self.ended)
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.ended {
            tracing::warn!(
                session_id = self.session_id,
                "Session dropped without end(), its log was not uploaded"
            );
        }
    }
}

/// Object key for a session log started at `started_at`
fn log_object_path(started_at: &DateTime<Utc>) -> String {
    format!(
        "{}/textLog_{}",
        LOG_PREFIX,
        started_at.format(LOG_TIMESTAMP_FORMAT)
    )
}
