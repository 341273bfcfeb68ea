//! Pipeline types
//!
//! Summary reported at the end of a run.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Object the input came from
    pub location: String,
    /// Size of the loaded blob
    pub bytes: usize,
    /// Records parsed
    pub total: usize,
    /// Records that survived the filter
    pub kept: usize,
    /// Records dropped as inactive
    pub dropped: usize,
    /// Rows inserted (0 on a dry run)
    pub inserted: usize,
    /// Target table, absent on a dry run
    pub table: Option<String>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}
