//! DuckDB-based record writer
//!
//! One call to [`DatabaseWriter::write_records`] opens one connection, runs
//! every INSERT inside one transaction, commits once and closes. The
//! transaction and connection are owned values: on any error they are
//! dropped, which rolls back the transaction and closes the connection.

use crate::config::{DatabaseConfig, DatabaseEngine};
use crate::error::{Error, Result};
use crate::types::{JsonValue, Record, WriteSummary};
use duckdb::types::Value as DuckValue;
use duckdb::{params, Connection};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Catalog alias for an attached external database
const TARGET_ALIAS: &str = "target_db";

static LIBPQ_PASSWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"password=('(?:[^'\\]|\\.)*'|\S+)").unwrap());

/// Destination for cleaned records
pub trait RecordSink: Send + Sync {
    /// Persist all records, or none of them
    fn write(&self, records: &[Record]) -> Result<WriteSummary>;
}

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCheck {
    pub engine: String,
    /// Connection target with the password masked
    pub target: String,
    pub table: String,
    pub table_exists: bool,
}

/// Writes records into `table(id, active)` through DuckDB
#[derive(Debug, Clone)]
pub struct DatabaseWriter {
    config: DatabaseConfig,
}

impl DatabaseWriter {
    /// Create a new writer. No connection is opened until a write or check.
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Connection string passed to DuckDB
    pub fn connection_string(&self) -> String {
        Self::build_connection_string(&self.config, false)
    }

    /// Connection string for logging (password masked)
    pub fn connection_info(&self) -> String {
        Self::build_connection_string(&self.config, true)
    }

    /// Build connection string from config
    fn build_connection_string(config: &DatabaseConfig, mask_password: bool) -> String {
        // If connection_string is provided, use it directly
        if let Some(ref conn_str) = config.connection_string {
            return if mask_password {
                mask_connection_string(conn_str)
            } else {
                conn_str.clone()
            };
        }

        match config.engine {
            DatabaseEngine::Postgres => {
                let password = if mask_password {
                    "****".to_string()
                } else {
                    libpq_value(&config.password)
                };
                format!(
                    "host={} port={} dbname={} user={} password={password} sslmode={}",
                    libpq_value(&config.host),
                    config.port(),
                    libpq_value(&config.dbname),
                    libpq_value(&config.user),
                    libpq_value(&config.ssl_mode),
                )
            }
            DatabaseEngine::Sqlite | DatabaseEngine::Duckdb => config
                .path
                .clone()
                .unwrap_or_else(|| ":memory:".to_string()),
        }
    }

    /// Table reference as seen from the DuckDB connection
    pub fn qualified_table(&self) -> String {
        let table = &self.config.table;
        match self.config.engine {
            DatabaseEngine::Postgres if table.contains('.') => format!("{TARGET_ALIAS}.{table}"),
            // Default to public schema for postgres
            DatabaseEngine::Postgres => format!("{TARGET_ALIAS}.public.{table}"),
            DatabaseEngine::Sqlite => format!("{TARGET_ALIAS}.{table}"),
            DatabaseEngine::Duckdb => table.clone(),
        }
    }

    /// Open a DuckDB connection with the target reachable
    fn open(&self) -> Result<Connection> {
        let target = self.connection_string();

        match self.config.engine {
            DatabaseEngine::Duckdb => {
                let conn = if target == ":memory:" {
                    Connection::open_in_memory()
                } else {
                    Connection::open(&target)
                };
                conn.map_err(|e| {
                    Error::database(format!("Failed to open DuckDB database {target}: {e}"))
                })
            }
            DatabaseEngine::Postgres => self.attach(&target, "postgres", "POSTGRES"),
            DatabaseEngine::Sqlite => self.attach(&target, "sqlite", "SQLITE"),
        }
    }

    /// Attach an external database through a DuckDB extension
    fn attach(&self, target: &str, extension: &str, db_type: &str) -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to create DuckDB connection: {e}")))?;

        conn.execute_batch(&format!("INSTALL {extension}; LOAD {extension};"))
            .map_err(|e| {
                Error::database(format!("Failed to load {extension} extension: {e}"))
            })?;

        let attach_sql = format!(
            "ATTACH {} AS {TARGET_ALIAS} (TYPE {db_type});",
            sql_literal(target)
        );
        conn.execute_batch(&attach_sql).map_err(|e| {
            Error::database(format!(
                "Failed to attach {} ({}): {e}",
                self.config.engine,
                self.connection_info()
            ))
        })?;

        Ok(conn)
    }

    fn create_table(&self, conn: &Connection, table: &str) -> Result<()> {
        tracing::debug!(table, "Creating table if missing");
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {table} (id BIGINT, active BOOLEAN);"
        ))
        .map_err(|e| Error::database(format!("Failed to create table {table}: {e}")))
    }

    /// Test the connection and look for the target table
    pub fn check_connection(&self) -> Result<TargetCheck> {
        let conn = self.open()?;

        let probe = match self.config.engine {
            DatabaseEngine::Postgres => "SELECT 1 FROM target_db.pg_catalog.pg_tables LIMIT 1",
            DatabaseEngine::Sqlite => "SELECT 1 FROM target_db.sqlite_master LIMIT 1",
            DatabaseEngine::Duckdb => "SELECT 1",
        };
        conn.execute_batch(probe)
            .map_err(|e| Error::database(format!("Connection check failed: {e}")))?;

        let table = self.qualified_table();
        let table_exists = conn
            .prepare(&format!("SELECT id, active FROM {table} LIMIT 0"))
            .is_ok();

        Ok(TargetCheck {
            engine: self.config.engine.to_string(),
            target: self.connection_info(),
            table: self.config.table.clone(),
            table_exists,
        })
    }

    /// Insert every record as one row and commit once
    pub fn write_records(&self, records: &[Record]) -> Result<WriteSummary> {
        tracing::info!(
            db = %self.connection_info(),
            table = %self.config.table,
            records = records.len(),
            "Writing to DB..."
        );

        let mut conn = self.open()?;
        let table = self.qualified_table();

        if self.config.create_table {
            self.create_table(&conn, &table)?;
        }

        let tx = conn
            .transaction()
            .map_err(|e| Error::database(format!("Failed to begin transaction: {e}")))?;

        {
            let insert_sql = format!("INSERT INTO {table} (id, active) VALUES (?, ?)");
            let mut stmt = tx
                .prepare(&insert_sql)
                .map_err(|e| Error::database(format!("Failed to prepare insert: {e}")))?;

            for (index, record) in records.iter().enumerate() {
                stmt.execute(params![id_param(record), active_param(record)])
                    .map_err(|e| {
                        Error::database(format!("Insert of record {index} failed: {e}"))
                    })?;
            }
        }

        tx.commit()
            .map_err(|e| Error::database(format!("Failed to commit: {e}")))?;

        tracing::info!(inserted = records.len(), table = %self.config.table, "Committed");

        Ok(WriteSummary {
            table: self.config.table.clone(),
            inserted: records.len(),
        })
    }
}

impl RecordSink for DatabaseWriter {
    fn write(&self, records: &[Record]) -> Result<WriteSummary> {
        self.write_records(records)
    }
}

/// Bind value for a record's `id`
fn id_param(record: &Record) -> DuckValue {
    record.id().map_or(DuckValue::Null, json_param)
}

/// Bind value for a record's `active`
///
/// A missing flag is `true`. A present value is bound as-is and cast to
/// BOOLEAN by the database, so `"false"` and `0` store `false`, `null`
/// stores NULL, and uncastable values fail the insert.
fn active_param(record: &Record) -> DuckValue {
    record.active().map_or(DuckValue::Boolean(true), json_param)
}

fn json_param(value: &JsonValue) -> DuckValue {
    match value {
        JsonValue::Null => DuckValue::Null,
        JsonValue::Bool(b) => DuckValue::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                DuckValue::BigInt(i)
            } else if let Some(f) = n.as_f64().filter(|_| !n.is_u64()) {
                DuckValue::Double(f)
            } else {
                DuckValue::Text(n.to_string())
            }
        }
        JsonValue::String(s) => DuckValue::Text(s.clone()),
        other => DuckValue::Text(other.to_string()),
    }
}

/// Quote a libpq keyword value when it needs it
fn libpq_value(value: &str) -> String {
    if !value.is_empty()
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '\\')
    {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// SQL string literal
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Mask the password in a URI or libpq connection string
fn mask_connection_string(conn_str: &str) -> String {
    if conn_str.contains("://") {
        if let Some(at_pos) = conn_str.rfind('@') {
            let scheme_end = conn_str.find("://").map_or(0, |i| i + 3);
            if let Some(colon_pos) = conn_str[scheme_end..at_pos].find(':') {
                let before_pass = &conn_str[..=scheme_end + colon_pos];
                let after_at = &conn_str[at_pos..];
                return format!("{before_pass}****{after_at}");
            }
        }
        return conn_str.to_string();
    }
    LIBPQ_PASSWORD
        .replace_all(conn_str, "password=****")
        .into_owned()
}
