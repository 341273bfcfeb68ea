//! Record parsing and active-flag filtering

use crate::config::CleanerConfig;
use crate::error::{Error, Result};
use crate::types::{CleanStats, JsonValue, Record};
use serde::Serialize;

/// Records that survived cleaning, with counts
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CleanOutput {
    pub records: Vec<Record>,
    pub stats: CleanStats,
}

/// Parses input blobs and filters out inactive records
#[derive(Debug, Clone, Copy, Default)]
pub struct Cleaner {
    /// Reject malformed records instead of passing them through
    strict: bool,
}

impl Cleaner {
    /// Create a permissive cleaner
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner that validates every record
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn from_config(config: &CleanerConfig) -> Self {
        Self {
            strict: config.strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse a JSON array of objects
    ///
    /// Fails on malformed JSON, on a top-level value that is not an array,
    /// and on array elements that are not objects.
    pub fn parse(&self, raw: &[u8]) -> Result<Vec<Record>> {
        let records: Vec<Record> = serde_json::from_slice(raw)?;

        if self.strict {
            for (index, record) in records.iter().enumerate() {
                validate_record(index, record)?;
            }
        }

        Ok(records)
    }

    /// Parse and filter a raw blob
    pub fn clean(&self, raw: &[u8]) -> Result<CleanOutput> {
        tracing::info!(bytes = raw.len(), "Cleaning data...");
        let records = self.parse(raw)?;
        Ok(self.filter(records))
    }

    /// Drop records whose `active` field is falsy
    pub fn filter(&self, records: Vec<Record>) -> CleanOutput {
        let total = records.len();
        let records = filter_active(records);
        let stats = CleanStats {
            total,
            kept: records.len(),
            dropped: total - records.len(),
        };

        tracing::info!(
            total = stats.total,
            kept = stats.kept,
            dropped = stats.dropped,
            "Cleaned records"
        );

        CleanOutput { records, stats }
    }
}

fn validate_record(index: usize, record: &Record) -> Result<()> {
    match record.id() {
        None | Some(JsonValue::Null) => {
            return Err(Error::invalid_record(index, "missing id"));
        }
        Some(_) => {}
    }

    match record.active() {
        None | Some(JsonValue::Bool(_)) => Ok(()),
        Some(other) => Err(Error::invalid_record(
            index,
            format!("active must be a boolean, got {other}"),
        )),
    }
}

/// Keep records that are not inactive, preserving order
pub fn filter_active(records: Vec<Record>) -> Vec<Record> {
    records.into_iter().filter(Record::is_active).collect()
}

/// Parse and filter with the default permissive cleaner
pub fn clean_data(raw: &[u8]) -> Result<Vec<Record>> {
    Ok(Cleaner::new().clean(raw)?.records)
}
