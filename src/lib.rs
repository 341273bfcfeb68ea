// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Active-records pipeline
//!
//! A small batch pipeline: fetch a JSON array from object storage, drop the
//! records marked inactive, insert the rest into a relational table.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use active_records_pipeline::{PipelineConfig, Pipeline, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::from_file("pipeline.yaml")?;
//!     let summary = Pipeline::from_config(&config)?.run().await?;
//!     println!("inserted {} rows into {:?}", summary.inserted, summary.table);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   bytes   ┌────────────┐  records  ┌────────────┐
//! │   Loader   │ ────────▶ │  Cleaner   │ ────────▶ │   Writer   │
//! │ S3/R2/GCS/ │           │ drop       │           │ one conn,  │
//! │ Azure/file │           │ inactive   │           │ one commit │
//! └────────────┘           └────────────┘           └────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Record and summary types
pub mod types;

/// Pipeline configuration
pub mod config;

/// Object storage loader
pub mod loader;

/// Record filtering
pub mod cleaner;

/// Database writer via DuckDB
pub mod database;

/// Loader → Cleaner → Writer composition
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::{CleanStats, Record, WriteSummary};

pub use cleaner::{clean_data, Cleaner};
pub use config::{DatabaseConfig, PipelineConfig, SourceConfig};
pub use database::{DatabaseWriter, RecordSink};
pub use loader::{load_object, BlobLoader, ObjectLoader, ObjectLocation};
pub use pipeline::{Pipeline, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
