//! Common types used throughout the pipeline
//!
//! The only entity is [`Record`], a JSON object carrying at least an `id`
//! and an optional `active` flag.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Record
// ============================================================================

/// Field holding the record identifier
pub const ID_FIELD: &str = "id";

/// Field holding the active flag
pub const ACTIVE_FIELD: &str = "active";

/// One input record
///
/// Serializes as the original object, unknown fields included. Nothing is
/// validated on construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(JsonObject);

impl Record {
    /// The raw `id` value, if present
    pub fn id(&self) -> Option<&JsonValue> {
        self.0.get(ID_FIELD)
    }

    /// The raw `active` value, if present
    pub fn active(&self) -> Option<&JsonValue> {
        self.0.get(ACTIVE_FIELD)
    }

    /// Whether the record survives cleaning
    ///
    /// A missing `active` counts as `true`. A present value is judged by
    /// truthiness: `false`, `null`, zero, `""`, `[]` and `{}` are inactive.
    pub fn is_active(&self) -> bool {
        self.active().map_or(true, is_truthy)
    }
}

/// Truthiness of a JSON value
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(fields) => !fields.is_empty(),
    }
}

// ============================================================================
// Summaries
// ============================================================================

/// Counts produced by the cleaner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleanStats {
    /// Records parsed from the input
    pub total: usize,
    /// Records that survived the filter
    pub kept: usize,
    /// Records dropped because `active` was falsy
    pub dropped: usize,
}

/// Result of one writer invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    /// Table the rows went into
    pub table: String,
    /// Number of rows inserted and committed
    pub inserted: usize,
}
