//! CLI runner - executes commands

use crate::cleaner::Cleaner;
use crate::cli::commands::{Cli, Commands, OutputFormat, SourceArgs};
use crate::config::PipelineConfig;
use crate::database::DatabaseWriter;
use crate::error::{Result, ResultExt};
use crate::loader::{BlobLoader, ObjectLoader, ObjectLocation};
use crate::pipeline::Pipeline;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// Input used by `clean` when no file or inline JSON is given
pub const SAMPLE_INPUT: &str = r#"[{"id":1,"active":true},{"id":2,"active":false}]"#;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Load { source } => self.load(source).await,
            Commands::Clean { input, json } => self.clean(input.as_deref(), json.as_deref()),
            Commands::Write { input, table } => self.write(input, table.as_deref()),
            Commands::Run {
                source,
                table,
                dry_run,
            } => self.run_pipeline(source, table.as_deref(), *dry_run).await,
            Commands::Check => self.check(),
            Commands::Ls { prefix, bucket } => {
                self.list_objects(prefix.as_deref(), bucket.as_deref())
                    .await
            }
        }
    }

    /// Load configuration
    fn load_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.cli.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration with command-line source and table overrides applied
    fn load_config_with(
        &self,
        source: Option<&SourceArgs>,
        table: Option<&str>,
    ) -> Result<PipelineConfig> {
        let mut config = self.load_config()?;

        if let Some(args) = source {
            if let Some(url) = &args.url {
                ObjectLocation::parse(url)?.apply_to(&mut config.source);
            }
            if let Some(bucket) = &args.bucket {
                config.source.bucket.clone_from(bucket);
            }
            if let Some(key) = &args.key {
                config.source.key.clone_from(key);
            }
        }

        if let Some(table) = table {
            config.database.table = table.to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Fetch the configured object and report its size
    async fn load(&self, source: &SourceArgs) -> Result<()> {
        let config = self.load_config_with(Some(source), None)?;
        let loader = ObjectLoader::from_config(&config.source)?;

        let data = loader.load(&config.source.key).await?;

        self.output_message(&json!({
            "type": "LOADED",
            "location": loader.describe(&config.source.key),
            "bytes": data.len()
        }));

        Ok(())
    }

    /// Clean a local file, inline JSON or the sample input
    fn clean(&self, input: Option<&Path>, inline: Option<&str>) -> Result<()> {
        let config = self.load_config()?;

        let raw = match (input, inline) {
            (Some(path), _) => read_input(path)?,
            (None, Some(json_str)) => json_str.as_bytes().to_vec(),
            (None, None) => SAMPLE_INPUT.as_bytes().to_vec(),
        };

        let output = Cleaner::from_config(&config.cleaner).clean(&raw)?;

        self.output_message(&json!({
            "type": "RECORDS",
            "records": output.records,
            "stats": output.stats
        }));

        Ok(())
    }

    /// Insert records from a local file, without filtering
    fn write(&self, input: &Path, table: Option<&str>) -> Result<()> {
        let config = self.load_config_with(None, table)?;

        let raw = read_input(input)?;
        let records = Cleaner::from_config(&config.cleaner).parse(&raw)?;

        let writer = DatabaseWriter::new(config.database);
        let summary = writer.write_records(&records)?;

        self.output_message(&json!({
            "type": "WRITTEN",
            "table": summary.table,
            "inserted": summary.inserted
        }));

        Ok(())
    }

    /// Run the whole pipeline
    async fn run_pipeline(
        &self,
        source: &SourceArgs,
        table: Option<&str>,
        dry_run: bool,
    ) -> Result<()> {
        let config = self.load_config_with(Some(source), table)?;
        let pipeline = Pipeline::from_config(&config)?;

        let summary = if dry_run {
            pipeline.run_dry().await?
        } else {
            pipeline.run().await?
        };

        self.output_message(&json!({
            "type": "RUN_SUMMARY",
            "summary": summary
        }));

        Ok(())
    }

    /// Check the database connection
    ///
    /// Prints a `CONNECTION_STATUS` message either way; a failed check is
    /// also returned as an error so the process exits non-zero.
    fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let writer = DatabaseWriter::new(config.database);

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Checking connection to {} database", writer.config().engine)
            }
        }));

        match writer.check_connection() {
            Ok(check) => {
                let message = if check.table_exists {
                    format!("Connection successful. Table '{}' found.", check.table)
                } else {
                    format!("Connection successful. Table '{}' not found.", check.table)
                };
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED",
                        "message": message,
                        "target": check.target,
                        "tableExists": check.table_exists
                    }
                }));
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": format!("Connection check failed: {e}"),
                        "target": writer.connection_info()
                    }
                }));
                return Err(e);
            }
        }

        Ok(())
    }

    /// List objects in the source bucket
    async fn list_objects(&self, prefix: Option<&str>, bucket: Option<&str>) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(bucket) = bucket {
            config.source.bucket = bucket.to_string();
        }
        config.validate()?;

        let loader = ObjectLoader::from_config(&config.source)?;
        let objects = loader.list(prefix).await?;

        self.output_message(&json!({
            "type": "OBJECTS",
            "bucket": config.source.bucket,
            "count": objects.len(),
            "objects": objects
        }));

        Ok(())
    }

    /// Output a JSON message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("Failed to read input file '{}'", path.display()))
}
