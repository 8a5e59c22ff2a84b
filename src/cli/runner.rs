//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, JobOverrides, OutputFormat};
use crate::config::TransferConfig;
use crate::config::ConnectionDef;
use crate::error::{Error, Result, ResultExt};
use crate::schema::field_dict;
use crate::source::executor_for;
use crate::transfer::{run_transfer, TransferJob};
use crate::warehouse::{hql, warehouse_for, LoadRequest};
use serde_json::{json, Value};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Placeholder file name shown by `plan`
const PLANNED_STAGING_FILE: &str = "hive_transfer_XXXXXX.csv";

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
            Commands::Run {
                overrides,
                recreate,
                no_create,
                no_overwrite,
            } => {
                self.transfer(overrides, *recreate, *no_create, *no_overwrite)
                    .await
            }
            Commands::Plan { overrides } => self.plan(overrides).await,
            Commands::Check => self.check().await,
        }
    }

    /// Config file contents (or defaults), not yet validated
    fn base_config(&self) -> Result<TransferConfig> {
        match &self.cli.config {
            Some(path) => TransferConfig::read(path),
            None => Ok(TransferConfig::new("", "")),
        }
    }

    /// Config with command-line overrides applied, validated
    fn job_config(&self, overrides: &JobOverrides) -> Result<TransferConfig> {
        let mut config = self.base_config()?;
        apply_overrides(&mut config, overrides);
        config.validate()?;
        Ok(config)
    }

    /// Run the transfer and print its report
    async fn transfer(
        &self,
        overrides: &JobOverrides,
        recreate: bool,
        no_create: bool,
        no_overwrite: bool,
    ) -> Result<()> {
        let mut config = self.job_config(overrides)?;
        if recreate {
            config.load.recreate = true;
        }
        if no_create {
            config.load.create = false;
        }
        if no_overwrite {
            config.load.overwrite = false;
        }

        let job = TransferJob::from_config(&config)?;
        let executor = executor_for(&config.source_connection()?)?;
        let warehouse = warehouse_for(&config.destination_connection()?)?;

        let report = run_transfer(&job, executor.as_ref(), warehouse.as_ref()).await?;

        self.output_message(&json!({
            "type": "TRANSFER_REPORT",
            "report": serde_json::to_value(&report).context("Failed to serialize transfer report")?,
        }));
        Ok(())
    }

    /// Describe the query and print the HiveQL a run would issue
    async fn plan(&self, overrides: &JobOverrides) -> Result<()> {
        let config = self.job_config(overrides)?;
        let job = TransferJob::from_config(&config)?;
        let executor = executor_for(&config.source_connection()?)?;

        let columns = executor.describe(&job.sql).await?;
        let fields = field_dict(&columns);

        let staging_path = job
            .tmp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
            .join(PLANNED_STAGING_FILE);
        let statements = hql::plan(&LoadRequest {
            path: &staging_path,
            table: &job.table,
            fields: &fields,
            options: &job.load,
            format: &job.format,
        });

        self.output_message(&json!({
            "type": "PLAN",
            "plan": {
                "table": job.table.to_string(),
                "columns": serde_json::to_value(&columns)?,
                "fields": serde_json::to_value(&fields)?,
                "hql": statements,
            }
        }));
        Ok(())
    }

    /// Check source and destination connectivity
    async fn check(&self) -> Result<()> {
        let config = self.base_config()?;
        let mut failures = 0;

        let source = config.source_connection();
        let kind = source.as_ref().ok().map(ConnectionDef::kind);
        let result = match source.and_then(|def| executor_for(&def)) {
            Ok(executor) => executor.check().await,
            Err(e) => Err(e),
        };
        if !self.output_status("source", &config.source_conn_id, kind, &result) {
            failures += 1;
        }

        let destination = config.destination_connection();
        let kind = destination.as_ref().ok().map(ConnectionDef::kind);
        let result = match destination.and_then(|def| warehouse_for(&def)) {
            Ok(warehouse) => warehouse.check().await,
            Err(e) => Err(e),
        };
        if !self.output_status("destination", &config.destination_conn_id, kind, &result) {
            failures += 1;
        }

        if failures > 0 {
            return Err(Error::Other(format!("{failures} connection check(s) failed")));
        }
        Ok(())
    }

    /// Print a connection status message; returns whether the check passed
    fn output_status(
        &self,
        role: &str,
        conn_id: &str,
        kind: Option<&str>,
        result: &Result<()>,
    ) -> bool {
        self.output_message(&connection_status(role, conn_id, kind, result));
        result.is_ok()
    }

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

/// Log filter for the binary.
///
/// `RUST_LOG` directives are used as given; `-v` raises the default level
/// to DEBUG on top of them. Without either the level is INFO.
pub fn log_filter(verbose: bool, env_directives: Option<&str>) -> EnvFilter {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    match env_directives.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) if !verbose => EnvFilter::new(directives),
        Some(directives) => EnvFilter::new(directives).add_directive(level.into()),
        None => EnvFilter::default().add_directive(level.into()),
    }
}

fn connection_status(role: &str, conn_id: &str, kind: Option<&str>, result: &Result<()>) -> Value {
    let (status, message) = match result {
        Ok(()) => ("SUCCEEDED", "Connection successful".to_string()),
        Err(e) => ("FAILED", format!("Connection failed: {e}")),
    };
    json!({
        "type": "CONNECTION_STATUS",
        "connectionStatus": {
            "role": role,
            "connection": conn_id,
            "kind": kind,
            "status": status,
            "message": message,
        }
    })
}

fn apply_overrides(config: &mut TransferConfig, overrides: &JobOverrides) {
    if let Some(sql) = &overrides.sql {
        config.sql.clone_from(sql);
    }
    if let Some(table) = &overrides.table {
        config.hive_table.clone_from(table);
    }
    for (key, value) in &overrides.partition {
        config.load.partition.insert(key.clone(), value.clone());
    }
    if let Some(id) = &overrides.source_conn_id {
        config.source_conn_id.clone_from(id);
    }
    if let Some(id) = &overrides.destination_conn_id {
        config.destination_conn_id.clone_from(id);
    }
}
