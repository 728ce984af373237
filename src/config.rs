//! Configuration loading for text-emotions
//!
//! Settings come from a TOML file resolved in priority order:
//! 1. Explicit path (tests, embedding callers)
//! 2. `TEXT_EMOTIONS_CONFIG` environment variable
//! 3. `./text-emotions.toml`
//!
//! The storage credential never lives in the file; it is read from
//! `TEXT_EMOTIONS_STORAGE_KEY` at session start.

use crate::error::{PipelineError, PipelineResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming an alternate config file location
pub const CONFIG_PATH_ENV: &str = "TEXT_EMOTIONS_CONFIG";

/// Environment variable holding the blob storage credential
pub const STORAGE_KEY_ENV: &str = "TEXT_EMOTIONS_STORAGE_KEY";

/// Default config file location relative to the working directory
const DEFAULT_CONFIG_PATH: &str = "text-emotions.toml";

fn default_bind() -> String {
    "0.0.0.0:8002".to_string()
}

/// Service settings loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Identifier of the pretrained emotion classifier artifact
    pub model_id: String,
    /// Datastore connection string (SQLite URL)
    pub database_url: String,
    /// Listen address for the HTTP surface
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Blob storage endpoint
    pub storage: StorageSettings,
}

/// Blob storage endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage service base URL
    pub url: String,
    /// Bucket receiving session log artifacts
    pub bucket: String,
}

impl Settings {
    /// Load settings from the resolved config file location
    pub fn load() -> PipelineResult<Self> {
        let path = resolve_config_path();
        if !path.exists() {
            return Err(PipelineError::Configuration(format!(
                "No config file found at {}. Set {} or create ./{}",
                path.display(),
                CONFIG_PATH_ENV,
                DEFAULT_CONFIG_PATH
            )));
        }
        Self::from_path(&path)
    }

    /// Load settings from an explicit path
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!("Read config {} failed: {}", path.display(), e))
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            PipelineError::Configuration(format!("Parse config {} failed: {}", path.display(), e))
        })?;

        settings.validate()?;
        info!(path = %path.display(), "Configuration loaded");
        Ok(settings)
    }

    /// Resolve the storage credential from the process environment
    ///
    /// Missing or blank credentials fail the invocation, never the process.
    pub fn storage_key() -> PipelineResult<String> {
        match std::env::var(STORAGE_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(PipelineError::Configuration(format!(
                "Storage credential not configured. Set {} in the process environment",
                STORAGE_KEY_ENV
            ))),
        }
    }

    fn validate(&self) -> PipelineResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "model_id must not be empty".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "database_url must not be empty".to_string(),
            ));
        }
        if self.storage.url.trim().is_empty() || self.storage.bucket.trim().is_empty() {
            return Err(PipelineError::Configuration(
                "storage.url and storage.bucket must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve the config file path: env var first, then the compiled default
fn resolve_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}
