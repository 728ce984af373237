//! Storage bucket client for session log artifacts
//!
//! Talks to a Supabase-style storage REST API: objects are created with a
//! single POST under the bucket, and a one-object list request serves as the
//! reachability probe at session start.

use crate::error::{PipelineError, PipelineResult};
use std::time::Duration;

const USER_AGENT: &str = concat!("text-emotions/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct StorageClient {
    http_client: reqwest::Client,
    base_url: String,
    bucket: String,
    api_key: String,
}

impl StorageClient {
    /// Build a client without touching the network
    pub fn new(base_url: &str, bucket: &str, api_key: &str) -> PipelineResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PipelineError::Connectivity(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Build a client and verify the bucket answers a list request
    pub async fn connect(base_url: &str, bucket: &str, api_key: &str) -> PipelineResult<Self> {
        let client = Self::new(base_url, bucket, api_key)?;
        client.probe().await?;
        Ok(client)
    }

    /// One-object list against the bucket, failing fast on a bad endpoint or key
    async fn probe(&self) -> PipelineResult<()> {
        let url = format!("{}/storage/v1/object/list/{}", self.base_url, self.bucket);
        tracing::debug!("Probing storage bucket {}", self.bucket);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "prefix": "", "limit": 1 }))
            .send()
            .await
            .map_err(|e| PipelineError::Connectivity(format!("storage unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Connectivity(format!(
                "storage probe rejected ({}): {}",
                status.as_u16(),
                body
            )));
        }
        Ok(())
    }

    /// Upload one plain-text object at `path` inside the bucket
    pub async fn upload_text(&self, path: &str, content: String) -> PipelineResult<()> {
        let url = self.object_url(path);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(content)
            .send()
            .await
            .map_err(|e| PipelineError::LogUpload(format!("log upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::LogUpload(format!(
                "log upload rejected ({}): {}",
                status.as_u16(),
                body
            )));
        }

        tracing::info!("Uploaded session log to {}/{}", self.bucket, path);
        Ok(())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }
}
