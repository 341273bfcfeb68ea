//! Database writer support via DuckDB
//!
//! This module inserts cleaned records into the target table using DuckDB as
//! the client. DuckDB reaches PostgreSQL and SQLite through its extensions and
//! writes native DuckDB files directly.

mod writer;

pub use writer::{DatabaseWriter, RecordSink, TargetCheck};

#[cfg(test)]
mod tests;
