//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Active-records pipeline CLI
#[derive(Parser, Debug)]
#[command(name = "active-records-pipeline")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the configured source object
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Bucket to read from
    #[arg(long)]
    pub bucket: Option<String>,

    /// Object key to read
    #[arg(long)]
    pub key: Option<String>,

    /// Full object URL, overrides provider, bucket and key
    /// Supports: s3://bucket/key, r2://bucket/key, gs://bucket/key, az://container/key, /local/path
    #[arg(long, conflicts_with_all = ["bucket", "key"])]
    pub url: Option<String>,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the input object and print its size
    Load {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Filter records, printing the ones that are not inactive
    Clean {
        /// JSON file to clean
        #[arg(short, long, conflicts_with = "json")]
        input: Option<PathBuf>,

        /// Inline JSON to clean
        #[arg(long)]
        json: Option<String>,
    },

    /// Insert records from a JSON file into the target table
    Write {
        /// JSON file holding an array of records
        #[arg(short, long)]
        input: PathBuf,

        /// Target table override
        #[arg(long)]
        table: Option<String>,
    },

    /// Load, clean and write
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Target table override
        #[arg(long)]
        table: Option<String>,

        /// Stop after cleaning, write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Test the database connection
    Check,

    /// List objects in the source bucket
    Ls {
        /// Only list keys under this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Bucket override
        #[arg(long)]
        bucket: Option<String>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
