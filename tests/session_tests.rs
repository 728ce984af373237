//! Session lifecycle tests
//!
//! Begin/end against an in-process storage stub: connectivity checks at
//! construction, log upload at teardown, and failure tolerance of the
//! best-effort upload.

mod common;

use std::sync::atomic::Ordering;
use text_emotions::services::Session;
use text_emotions::PipelineError;

use common::{seeded_database, spawn_storage_stub, test_settings, unreachable_url, StorageStub};

#[tokio::test]
async fn test_end_uploads_buffered_log_as_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    let (database_url, _pool) = seeded_database(dir.path()).await;
    let stub = StorageStub::new();
    let storage_url = spawn_storage_stub(stub.clone()).await;

    let session =
        Session::begin_with_settings(7, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap();
    assert_eq!(session.session_id(), 7);
    assert_eq!(session.interview_id(), 12);
    // The session carries its resolved settings for the rest of the run
    assert_eq!(session.settings().storage.bucket, "session-logs");
    assert_eq!(session.settings().model_id, "stand-in/emotion-model");

    session.logger().info("first line");
    session.logger().error("second line");
    session.end().await;

    let uploads = stub.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bucket, "session-logs");
    assert!(uploads[0].path.starts_with("logs/textLog_"));
    assert_eq!(uploads[0].content_type, "text/plain");

    let lines: Vec<&str> = uploads[0].body.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("Connection to storage bucket session-logs successful"));
    assert!(lines[1].contains("INFO [session 7] first line"));
    assert!(lines[2].contains("ERROR [session 7] second line"));
    // Each line opens with a bracketed timestamp
    assert!(lines.iter().all(|line| line.starts_with('[')));
}

#[tokio::test]
async fn test_log_filename_embeds_session_start_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let (database_url, _pool) = seeded_database(dir.path()).await;
    let stub = StorageStub::new();
    let storage_url = spawn_storage_stub(stub.clone()).await;

    let session =
        Session::begin_with_settings(3, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap();
    session.end().await;

    let uploads = stub.uploads();
    assert_eq!(uploads.len(), 1);
    // logs/textLog_YYYY_MM_DD_HH.MM.SS
    let name = uploads[0]
        .path
        .strip_prefix("logs/textLog_")
        .expect("log path should carry the fixed prefix");
    assert_eq!(name.len(), 19);
    assert!(name.chars().all(|c| c.is_ascii_digit() || c == '_' || c == '.'));
}

#[tokio::test]
async fn test_end_skips_upload_when_buffer_already_drained() {
    let dir = tempfile::tempdir().unwrap();
    let (database_url, _pool) = seeded_database(dir.path()).await;
    let stub = StorageStub::new();
    let storage_url = spawn_storage_stub(stub.clone()).await;

    let session =
        Session::begin_with_settings(7, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap();

    // Drain the buffer out from under the session; flush is once-only
    let drained = session.logger().buffer().flush();
    assert!(drained.contains("Connection to storage bucket"));

    session.end().await;
    assert!(stub.uploads().is_empty());
}

#[tokio::test]
async fn test_upload_failure_is_swallowed() {
    let dir = tempfile::tempdir().unwrap();
    let (database_url, _pool) = seeded_database(dir.path()).await;
    let stub = StorageStub::new();
    let storage_url = spawn_storage_stub(stub.clone()).await;

    let session =
        Session::begin_with_settings(7, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap();

    // Storage goes down after the session opened
    stub.fail_uploads.store(true, Ordering::SeqCst);
    session.logger().info("will be lost");
    session.end().await;

    // end() returned normally and nothing was stored
    assert!(stub.uploads().is_empty());
}

#[tokio::test]
async fn test_begin_rejects_unreachable_storage() {
    let dir = tempfile::tempdir().unwrap();
    let (database_url, _pool) = seeded_database(dir.path()).await;
    let storage_url = unreachable_url().await;

    let err =
        Session::begin_with_settings(7, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap_err();
    assert!(matches!(err, PipelineError::Connectivity(_)));
}

#[tokio::test]
async fn test_begin_rejects_storage_probe_denial() {
    let dir = tempfile::tempdir().unwrap();
    let (database_url, _pool) = seeded_database(dir.path()).await;
    let stub = StorageStub::new();
    stub.fail_probe.store(true, Ordering::SeqCst);
    let storage_url = spawn_storage_stub(stub.clone()).await;

    let err =
        Session::begin_with_settings(7, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap_err();
    match err {
        PipelineError::Connectivity(message) => {
            assert!(message.contains("probe rejected"));
        }
        other => panic!("expected connectivity error, got {:?}", other),
    }
    assert!(stub.uploads().is_empty());
}

#[tokio::test]
async fn test_begin_rejects_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let stub = StorageStub::new();
    let storage_url = spawn_storage_stub(stub.clone()).await;

    // No mode=rwc, so the missing file is not created
    let database_url = format!("sqlite:{}/absent.db", dir.path().display());
    let err =
        Session::begin_with_settings(7, 12, test_settings(&database_url, &storage_url), "key")
            .await
            .unwrap_err();
    assert!(matches!(err, PipelineError::Connectivity(_)));
}
