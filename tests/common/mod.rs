//! Shared helpers for integration tests: an in-process storage stub, a
//! seeded results database, and a deterministic stand-in model.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use text_emotions::config::{Settings, StorageSettings};
use text_emotions::services::{FixedLogitsModel, ModelCell, ModelRegistry};

/// One object captured by the storage stub
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub content_type: String,
    pub body: String,
}

/// In-process stand-in for the storage REST API
#[derive(Clone, Default)]
pub struct StorageStub {
    uploads: Arc<Mutex<Vec<StoredObject>>>,
    pub fail_probe: Arc<AtomicBool>,
    pub fail_uploads: Arc<AtomicBool>,
}

impl StorageStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploads(&self) -> Vec<StoredObject> {
        self.uploads.lock().unwrap().clone()
    }
}

async fn list_objects(
    State(stub): State<StorageStub>,
    Path(_bucket): Path<String>,
) -> impl IntoResponse {
    if stub.fail_probe.load(Ordering::SeqCst) {
        return (StatusCode::FORBIDDEN, "invalid key").into_response();
    }
    Json(json!([])).into_response()
}

async fn store_object(
    State(stub): State<StorageStub>,
    Path((bucket, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    if stub.fail_uploads.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage down").into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let key = format!("{}/{}", bucket, path);
    stub.uploads.lock().unwrap().push(StoredObject {
        bucket,
        path,
        content_type,
        body,
    });
    Json(json!({ "Key": key })).into_response()
}

/// Serve the stub on an ephemeral port, returning its base URL
pub async fn spawn_storage_stub(stub: StorageStub) -> String {
    let app = Router::new()
        .route("/storage/v1/object/list/:bucket", post(list_objects))
        .route("/storage/v1/object/:bucket/*path", post(store_object))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// An address nothing listens on, for connectivity failure tests
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Create a results database under `dir`, seeded with interview 12: two
/// interviewee utterances and one interviewer line
pub async fn seeded_database(dir: &std::path::Path) -> (String, SqlitePool) {
    let db_path = dir.join("results.db");
    let database_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let pool = SqlitePool::connect(&database_url).await.unwrap();
    text_emotions::db::create_results_table(&pool).await.unwrap();

    for (id, interview_id, speaker, text) in [
        (1_i64, 12_i64, 0_i64, "hi"),
        (2, 12, 0, "bye"),
        (3, 12, 1, "interviewer question"),
    ] {
        sqlx::query("INSERT INTO results (id, interview_id, speaker, text) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(interview_id)
            .bind(speaker)
            .bind(text)
            .execute(&pool)
            .await
            .unwrap();
    }

    (database_url, pool)
}

/// Settings pointing at a test database and storage endpoint
pub fn test_settings(database_url: &str, storage_url: &str) -> Settings {
    Settings {
        model_id: "stand-in/emotion-model".to_string(),
        database_url: database_url.to_string(),
        bind: "127.0.0.1:0".to_string(),
        storage: StorageSettings {
            url: storage_url.to_string(),
            bucket: "session-logs".to_string(),
        },
    }
}

/// Model cell pre-warmed with a deterministic three-label stand-in
///
/// Logits [2.0, -1.0, 0.0] for [joy, anger, fear] rank as joy, fear, anger.
pub fn stand_in_models() -> Arc<ModelCell> {
    let registry = ModelRegistry::with_model(
        "stand-in/emotion-model",
        Box::new(FixedLogitsModel::new(
            &["joy", "anger", "fear"],
            &[2.0, -1.0, 0.0],
        )),
    );
    Arc::new(ModelCell::preloaded(registry))
}
