//! Pipeline module
//!
//! Loader → Cleaner → Writer, run once, in order.
//!
//! # Overview
//!
//! The pipeline module provides:
//! - `Pipeline` - composes a [`BlobLoader`], a [`Cleaner`] and a [`RecordSink`]
//! - `RunSummary` - what was loaded, kept and inserted
//!
//! A failure in any stage stops the run; later stages are never invoked.

mod types;

pub use types::RunSummary;

use crate::cleaner::Cleaner;
use crate::config::PipelineConfig;
use crate::database::{DatabaseWriter, RecordSink};
use crate::error::Result;
use crate::loader::{BlobLoader, ObjectLoader};
use chrono::Utc;
use std::time::Instant;

/// One configured pipeline run
pub struct Pipeline<L, S> {
    loader: L,
    cleaner: Cleaner,
    sink: S,
    /// Object key to load
    key: String,
}

impl Pipeline<ObjectLoader, DatabaseWriter> {
    /// Build the object-store loader and database writer from config
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let loader = ObjectLoader::from_config(&config.source)?;
        let cleaner = Cleaner::from_config(&config.cleaner);
        let writer = DatabaseWriter::new(config.database.clone());
        Ok(Self::new(loader, cleaner, writer, config.source.key.clone()))
    }
}

impl<L: BlobLoader, S: RecordSink> Pipeline<L, S> {
    /// Create a pipeline from its stages
    pub fn new(loader: L, cleaner: Cleaner, sink: S, key: impl Into<String>) -> Self {
        Self {
            loader,
            cleaner,
            sink,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Load, clean and write
    pub async fn run(&self) -> Result<RunSummary> {
        self.execute(false).await
    }

    /// Load and clean without writing
    pub async fn run_dry(&self) -> Result<RunSummary> {
        self.execute(true).await
    }

    async fn execute(&self, dry_run: bool) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();
        let location = self.loader.describe(&self.key);

        let raw = self.loader.load(&self.key).await?;
        let cleaned = self.cleaner.clean(&raw)?;

        let (inserted, table) = if dry_run {
            tracing::info!(
                kept = cleaned.stats.kept,
                "Dry run, skipping database write"
            );
            (0, None)
        } else {
            let written = self.sink.write(&cleaned.records)?;
            (written.inserted, Some(written.table))
        };

        let summary = RunSummary {
            location,
            bytes: raw.len(),
            total: cleaned.stats.total,
            kept: cleaned.stats.kept,
            dropped: cleaned.stats.dropped,
            inserted,
            table,
            dry_run,
            started_at,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::info!(
            location = %summary.location,
            kept = summary.kept,
            dropped = summary.dropped,
            inserted = summary.inserted,
            duration_ms = summary.duration_ms,
            "Pipeline finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests;
