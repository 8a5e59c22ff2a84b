//! Transfer orchestration
//!
//! Runs the query into a staging file, then loads that file into the
//! destination table. Stages run strictly in sequence; the first error
//! aborts the run and is returned unchanged.

use crate::config::TransferConfig;
use crate::error::Result;
use crate::schema::field_dict;
use crate::source::QueryExecutor;
use crate::stage::{StagingFormat, StagingWriter};
use crate::types::FieldDict;
use crate::warehouse::{load_staged_file, LoadOptions, LoadRequest, TableName, Warehouse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// One query-to-table transfer
#[derive(Debug, Clone)]
pub struct TransferJob {
    pub sql: String,
    pub table: TableName,
    pub load: LoadOptions,
    pub format: StagingFormat,
    /// Directory for the staging file (system temp dir when unset)
    pub tmp_dir: Option<PathBuf>,
}

impl TransferJob {
    pub fn new(sql: impl Into<String>, table: TableName) -> Self {
        Self {
            sql: sql.into(),
            table,
            load: LoadOptions::default(),
            format: StagingFormat::default(),
            tmp_dir: None,
        }
    }

    /// Build a job from a validated config
    pub fn from_config(config: &TransferConfig) -> Result<Self> {
        Ok(Self {
            sql: config.sql.clone(),
            table: config.table()?,
            load: config.load.clone(),
            format: config.format.clone(),
            tmp_dir: config.tmp_dir.clone(),
        })
    }

    #[must_use]
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: StagingFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = Some(tmp_dir.into());
        self
    }
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    /// Destination table
    pub table: String,
    /// Column name -> destination type
    pub fields: FieldDict,
    /// Rows staged and loaded
    pub rows: u64,
    /// Size of the staging file
    pub staged_bytes: u64,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Run one transfer: query, map types, stage, load
pub async fn run_transfer(
    job: &TransferJob,
    executor: &dyn QueryExecutor,
    warehouse: &dyn Warehouse,
) -> Result<TransferReport> {
    let started_at = Utc::now();
    let start = Instant::now();

    job.format.validate()?;
    job.load.validate()?;

    tracing::info!("Dumping {} query results to local file", executor.system());
    let mut writer = StagingWriter::create(&job.format, job.tmp_dir.as_deref())?;
    let rows = executor.execute(&job.sql, &mut writer).await?;

    let fields = field_dict(writer.columns());
    let staged = writer.finish()?;
    tracing::info!(
        "Staged {} rows ({} bytes) at {}",
        rows,
        staged.bytes(),
        staged.path().display()
    );

    tracing::info!("Loading file into {} table {}", warehouse.system(), job.table);
    let request = LoadRequest {
        path: staged.path(),
        table: &job.table,
        fields: &fields,
        options: &job.load,
        format: &job.format,
    };
    load_staged_file(warehouse, &request).await?;

    let staged_bytes = staged.bytes();
    if let Err(e) = staged.close() {
        tracing::warn!("Failed to remove staging file: {}", e);
    }

    let elapsed_ms = start.elapsed().as_millis() as u64;
    tracing::info!("Loaded {} rows into {} in {}ms", rows, job.table, elapsed_ms);

    Ok(TransferReport {
        table: job.table.to_string(),
        fields,
        rows,
        staged_bytes,
        started_at,
        elapsed_ms,
    })
}
