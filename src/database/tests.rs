//! Tests for database module
//!
//! Writes go to DuckDB files in temp directories, so no server is needed.

use super::*;
use crate::config::{DatabaseConfig, DatabaseEngine};
use crate::error::Error;
use crate::types::Record;
use duckdb::Connection;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn duckdb_target(dir: &TempDir) -> (DatabaseConfig, PathBuf) {
    let path = dir.path().join("target.duckdb");
    let config = DatabaseConfig {
        engine: DatabaseEngine::Duckdb,
        path: Some(path.to_str().unwrap().to_string()),
        create_table: true,
        ..DatabaseConfig::default()
    };
    (config, path)
}

fn records(value: serde_json::Value) -> Vec<Record> {
    serde_json::from_value(value).unwrap()
}

fn read_rows(path: &Path) -> Vec<(i64, bool)> {
    read_flags(path)
        .into_iter()
        .map(|(id, active)| (id, active.expect("active is NULL")))
        .collect()
}

fn read_flags(path: &Path) -> Vec<(i64, Option<bool>)> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn
        .prepare("SELECT id, active FROM records ORDER BY rowid")
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    rows
}

// ============================================================================
// Write Tests
// ============================================================================

#[test]
fn test_write_inserts_rows_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);
    let writer = DatabaseWriter::new(config);

    let summary = writer
        .write_records(&records(json!([
            {"id": 3, "active": true},
            {"id": 1, "active": false},
            {"id": 2}
        ])))
        .unwrap();

    assert_eq!(summary.inserted, 3);
    assert_eq!(summary.table, "records");
    assert_eq!(read_rows(&path), vec![(3, true), (1, false), (2, true)]);
}

#[test]
fn test_write_empty_commits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);
    let writer = DatabaseWriter::new(config);

    let summary = writer.write_records(&[]).unwrap();

    assert_eq!(summary.inserted, 0);
    assert!(read_rows(&path).is_empty());
}

#[test]
fn test_write_through_record_sink() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);
    let sink: Box<dyn RecordSink> = Box::new(DatabaseWriter::new(config));

    sink.write(&records(json!([{"id": 10}]))).unwrap();
    assert_eq!(read_rows(&path), vec![(10, true)]);
}

#[test]
fn test_rerun_duplicates_rows() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);
    let writer = DatabaseWriter::new(config);
    let batch = records(json!([{"id": 1, "active": true}]));

    writer.write_records(&batch).unwrap();
    writer.write_records(&batch).unwrap();

    assert_eq!(read_rows(&path), vec![(1, true), (1, true)]);
}

#[test]
fn test_write_string_ids() {
    let dir = tempfile::tempdir().unwrap();
    let (mut config, path) = duckdb_target(&dir);
    config.create_table = false;
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE records (id VARCHAR, active BOOLEAN);")
            .unwrap();
    }

    DatabaseWriter::new(config)
        .write_records(&records(json!([{"id": "a-1"}, {"id": "b-2", "active": false}])))
        .unwrap();

    let conn = Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare("SELECT id, active FROM records ORDER BY rowid")
        .unwrap();
    let rows: Vec<(String, bool)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    assert_eq!(
        rows,
        vec![("a-1".to_string(), true), ("b-2".to_string(), false)]
    );
}

#[test]
fn test_present_active_is_stored_as_given() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);

    DatabaseWriter::new(config)
        .write_records(&records(json!([
            {"id": 1, "active": null},
            {"id": 2, "active": 0},
            {"id": 3, "active": "false"},
            {"id": 4, "active": true},
            {"id": 5}
        ])))
        .unwrap();

    assert_eq!(
        read_flags(&path),
        vec![
            (1, None),
            (2, Some(false)),
            (3, Some(false)),
            (4, Some(true)),
            (5, Some(true))
        ]
    );
}

#[test]
fn test_cleaned_falsy_flags_never_stored_as_true() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);
    let raw = br#"[{"id":1,"active":null},{"id":2,"active":0},{"id":3,"active":"false"},{"id":4,"active":""}]"#;

    let cleaned = crate::cleaner::clean_data(raw).unwrap();
    DatabaseWriter::new(config).write_records(&cleaned).unwrap();

    assert_eq!(read_flags(&path), vec![(3, Some(false))]);
}

// ============================================================================
// Failure Tests
// ============================================================================

#[test]
fn test_missing_table_fails_and_releases_connection() {
    let dir = tempfile::tempdir().unwrap();
    let (mut config, path) = duckdb_target(&dir);
    config.create_table = false;

    let err = DatabaseWriter::new(config)
        .write_records(&records(json!([{"id": 1}])))
        .unwrap_err();
    assert!(matches!(err, Error::Database { .. }), "unexpected: {err}");

    // The file is not locked by a leaked connection
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("SELECT 1").unwrap();
}

#[test]
fn test_insert_failure_rolls_back_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (mut config, path) = duckdb_target(&dir);
    config.create_table = false;
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE records (id BIGINT PRIMARY KEY, active BOOLEAN);")
            .unwrap();
    }

    let result = DatabaseWriter::new(config).write_records(&records(json!([
        {"id": 1},
        {"id": 2},
        {"id": 1}
    ])));

    assert!(result.is_err());
    assert!(read_rows(&path).is_empty());
}

#[test]
fn test_non_numeric_id_into_bigint_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (config, path) = duckdb_target(&dir);

    let result = DatabaseWriter::new(config)
        .write_records(&records(json!([{"id": 1}, {"id": "not-a-number"}])));

    assert!(result.is_err());
    assert!(read_rows(&path).is_empty());
}

// ============================================================================
// Connection Tests
// ============================================================================

#[test]
fn test_check_connection_reports_table() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _path) = duckdb_target(&dir);
    let writer = DatabaseWriter::new(config);

    let before = writer.check_connection().unwrap();
    assert_eq!(before.engine, "duckdb");
    assert!(!before.table_exists);

    writer.write_records(&[]).unwrap();

    let after = writer.check_connection().unwrap();
    assert!(after.table_exists);
}

#[test]
fn test_in_memory_duckdb_target() {
    let config = DatabaseConfig {
        engine: DatabaseEngine::Duckdb,
        create_table: true,
        ..DatabaseConfig::default()
    };
    let writer = DatabaseWriter::new(config);
    assert_eq!(writer.connection_string(), ":memory:");

    let summary = writer
        .write_records(&records(json!([{"id": 1}, {"id": 2}])))
        .unwrap();
    assert_eq!(summary.inserted, 2);
}

#[test]
fn test_postgres_connection_string_from_components() {
    let writer = DatabaseWriter::new(DatabaseConfig::default());

    assert_eq!(
        writer.connection_string(),
        "host=localhost port=5432 dbname=test user=postgres password=postgres sslmode=prefer"
    );
    assert_eq!(
        writer.connection_info(),
        "host=localhost port=5432 dbname=test user=postgres password=**** sslmode=prefer"
    );
}

#[test]
fn test_explicit_connection_string_is_masked() {
    let writer = DatabaseWriter::new(DatabaseConfig {
        connection_string: Some("postgresql://app:s3cret@db:5432/prod".to_string()),
        ..DatabaseConfig::default()
    });

    assert_eq!(
        writer.connection_string(),
        "postgresql://app:s3cret@db:5432/prod"
    );
    assert!(!writer.connection_info().contains("s3cret"));
}

#[test]
fn test_qualified_table() {
    let postgres = DatabaseWriter::new(DatabaseConfig::default());
    assert_eq!(postgres.qualified_table(), "target_db.public.records");

    let staged = DatabaseWriter::new(DatabaseConfig {
        table: "staging.records".to_string(),
        ..DatabaseConfig::default()
    });
    assert_eq!(staged.qualified_table(), "target_db.staging.records");

    let sqlite = DatabaseWriter::new(DatabaseConfig {
        engine: DatabaseEngine::Sqlite,
        path: Some("target.db".to_string()),
        ..DatabaseConfig::default()
    });
    assert_eq!(sqlite.qualified_table(), "target_db.records");

    let duck = DatabaseWriter::new(DatabaseConfig {
        engine: DatabaseEngine::Duckdb,
        ..DatabaseConfig::default()
    });
    assert_eq!(duck.qualified_table(), "records");
}
