//! Tests for pipeline module

use super::*;
use crate::config::{DatabaseConfig, DatabaseEngine, StorageProvider};
use crate::error::Error;
use crate::types::{Record, WriteSummary};
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Sink that remembers every batch it was given
#[derive(Default)]
struct RecordingSink {
    batches: Mutex<Vec<Vec<Record>>>,
}

impl RecordingSink {
    fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    fn last_batch(&self) -> Vec<Record> {
        self.batches.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl RecordSink for RecordingSink {
    fn write(&self, records: &[Record]) -> Result<WriteSummary> {
        self.batches.lock().unwrap().push(records.to_vec());
        Ok(WriteSummary {
            table: "records".to_string(),
            inserted: records.len(),
        })
    }
}

/// Sink that always fails
struct FailingSink;

impl RecordSink for FailingSink {
    fn write(&self, _records: &[Record]) -> Result<WriteSummary> {
        Err(Error::database("connection refused"))
    }
}

async fn loader_with(key: &str, body: &str) -> ObjectLoader {
    let store = InMemory::new();
    store
        .put(&ObjectPath::from(key), Bytes::from(body.to_string()).into())
        .await
        .unwrap();
    ObjectLoader::new(Arc::new(store), StorageProvider::S3, "demo-bucket")
}

#[tokio::test]
async fn test_run_filters_and_writes() {
    let loader = loader_with(
        "input.json",
        r#"[{"id":1,"active":true},{"id":2,"active":false},{"id":3}]"#,
    )
    .await;
    let pipeline = Pipeline::new(loader, Cleaner::new(), RecordingSink::default(), "input.json");

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.location, "s3://demo-bucket/input.json");
    assert_eq!(summary.total, 3);
    assert_eq!(summary.kept, 2);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.table.as_deref(), Some("records"));
    assert!(!summary.dry_run);
    assert!(summary.finished_at >= summary.started_at);

    assert_eq!(pipeline.sink().calls(), 1);
    assert_eq!(
        serde_json::to_value(pipeline.sink().last_batch()).unwrap(),
        json!([{"id": 1, "active": true}, {"id": 3}])
    );
}

#[tokio::test]
async fn test_malformed_json_never_reaches_writer() {
    let loader = loader_with("input.json", r#"[{"id":1,"active":true},"#).await;
    let pipeline = Pipeline::new(loader, Cleaner::new(), RecordingSink::default(), "input.json");

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, Error::JsonParse(_)));
    assert_eq!(pipeline.sink().calls(), 0);
}

#[tokio::test]
async fn test_missing_object_never_reaches_writer() {
    let loader = loader_with("other.json", "[]").await;
    let pipeline = Pipeline::new(loader, Cleaner::new(), RecordingSink::default(), "input.json");

    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, Error::ObjectNotFound { .. }));
    assert_eq!(pipeline.sink().calls(), 0);
}

#[tokio::test]
async fn test_empty_array_still_writes() {
    let loader = loader_with("input.json", "[]").await;
    let pipeline = Pipeline::new(loader, Cleaner::new(), RecordingSink::default(), "input.json");

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.inserted, 0);
    assert_eq!(pipeline.sink().calls(), 1);
    assert!(pipeline.sink().last_batch().is_empty());
}

#[tokio::test]
async fn test_dry_run_skips_writer() {
    let loader = loader_with("input.json", r#"[{"id":1},{"id":2,"active":false}]"#).await;
    let pipeline = Pipeline::new(loader, Cleaner::new(), RecordingSink::default(), "input.json");

    let summary = pipeline.run_dry().await.unwrap();

    assert!(summary.dry_run);
    assert_eq!(summary.kept, 1);
    assert_eq!(summary.inserted, 0);
    assert!(summary.table.is_none());
    assert_eq!(pipeline.sink().calls(), 0);
}

#[tokio::test]
async fn test_writer_error_propagates() {
    let loader = loader_with("input.json", r#"[{"id":1}]"#).await;
    let pipeline = Pipeline::new(loader, Cleaner::new(), FailingSink, "input.json");

    let err = pipeline.run().await.unwrap_err();
    assert_eq!(err.to_string(), "Database error: connection refused");
}

#[tokio::test]
async fn test_strict_cleaner_rejects_before_write() {
    let loader = loader_with("input.json", r#"[{"id":1},{"active":true}]"#).await;
    let pipeline = Pipeline::new(
        loader,
        Cleaner::strict(),
        RecordingSink::default(),
        "input.json",
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, Error::InvalidRecord { index: 1, .. }));
    assert_eq!(pipeline.sink().calls(), 0);
}

#[tokio::test]
async fn test_end_to_end_into_duckdb() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pipeline.duckdb");
    let writer = DatabaseWriter::new(DatabaseConfig {
        engine: DatabaseEngine::Duckdb,
        path: Some(db_path.to_str().unwrap().to_string()),
        create_table: true,
        ..DatabaseConfig::default()
    });
    let loader = loader_with(
        "input.json",
        r#"[{"id":1,"active":true},{"id":2,"active":false},{"id":3}]"#,
    )
    .await;

    let summary = Pipeline::new(loader, Cleaner::new(), writer, "input.json")
        .run()
        .await
        .unwrap();
    assert_eq!(summary.inserted, 2);

    let conn = duckdb::Connection::open(&db_path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM records WHERE active", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn test_from_config_uses_source_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::default();
    config.source.provider = StorageProvider::Local;
    config.source.bucket = dir.path().to_str().unwrap().to_string();
    config.source.key = "exports/day.json".to_string();

    let pipeline = Pipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.key(), "exports/day.json");
}
