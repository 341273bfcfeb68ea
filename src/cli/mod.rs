//! CLI module
//!
//! Command-line interface for running the pipeline or a single stage.
//!
//! # Commands
//!
//! - `load` - Fetch the input object and report its size
//! - `clean` - Filter a local JSON file, inline JSON, or the built-in sample
//! - `write` - Insert records from a local JSON file
//! - `run` - Load, clean and write
//! - `check` - Test the database connection
//! - `ls` - List objects in the source bucket

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, SourceArgs};
pub use runner::Runner;
