//! Query executor module
//!
//! Runs the transfer query against the source database and streams the
//! result, row by row, into a `RowSink`.
//!
//! # Overview
//!
//! - `QueryExecutor` - describe / execute / check against one source
//! - `RowSink` - receives the column metadata, then every row
//! - `MySqlExecutor` - MySQL through sqlx
//! - `DuckDbExecutor` - DuckDB file, optionally attaching another database

mod duckdb;
mod mysql;

pub use self::duckdb::DuckDbExecutor;
pub use mysql::MySqlExecutor;

use crate::config::ConnectionDef;
use crate::error::{Error, Result};
use crate::schema::ColumnDescriptor;
use async_trait::async_trait;

/// Consumer of a query result
pub trait RowSink: Send {
    /// Called once with the result columns, before any row
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<()>;

    /// Called once per row, in result order
    fn write_row(&mut self, row: &[Option<String>]) -> Result<()>;
}

/// Source database that can run the transfer query
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// System name used in logs and errors
    fn system(&self) -> &'static str;

    /// Verify the source is reachable
    async fn check(&self) -> Result<()>;

    /// Result columns of `sql`, without fetching rows
    async fn describe(&self, sql: &str) -> Result<Vec<ColumnDescriptor>>;

    /// Run `sql`, streaming the result into `sink`; returns the row count.
    ///
    /// The connection is closed before this returns, on success or error.
    async fn execute(&self, sql: &str, sink: &mut dyn RowSink) -> Result<u64>;
}

/// Build the executor for a source connection
pub fn executor_for(def: &ConnectionDef) -> Result<Box<dyn QueryExecutor>> {
    match def {
        ConnectionDef::Mysql(mysql) => Ok(Box::new(MySqlExecutor::new(mysql)?)),
        ConnectionDef::Duckdb(duck) => Ok(Box::new(DuckDbExecutor::new(duck.clone()))),
        ConnectionDef::HiveCli(_) => Err(Error::invalid_value(
            "source connection",
            "hive_cli connections can only be used as a destination",
        )),
    }
}

/// Sink that keeps every row in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RowSink for CollectingSink {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn write_row(&mut self, row: &[Option<String>]) -> Result<()> {
        self.rows.push(row.to_vec());
        Ok(())
    }
}
