//! Warehouse loader module
//!
//! Materializes a staged file as a table in the destination.
//!
//! # Overview
//!
//! - `Warehouse` - destination operations (exists / drop / create / load)
//! - `HiveCli` - Hive through `beeline` or the `hive` CLI
//! - `DuckDbWarehouse` - local DuckDB database with Hive-like load semantics
//! - `load_staged_file` - the create/recreate/partition sequence shared by all
//! - `hql` - HiveQL statement builders

mod duckdb;
mod hive;
pub mod hql;
mod types;

pub use self::duckdb::DuckDbWarehouse;
pub use hive::HiveCli;
pub use types::{validate_identifier, LoadOptions, LoadRequest, TableName};

use crate::config::ConnectionDef;
use crate::error::{Error, Result};
use async_trait::async_trait;

/// Destination of a transfer
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// System name used in logs and errors
    fn system(&self) -> &'static str;

    /// Verify the destination is reachable
    async fn check(&self) -> Result<()>;

    /// Whether the table exists
    async fn table_exists(&self, table: &TableName) -> Result<bool>;

    /// Drop the table if it exists
    async fn drop_table(&self, table: &TableName) -> Result<()>;

    /// Create the table if it does not exist
    async fn create_table(&self, request: &LoadRequest<'_>) -> Result<()>;

    /// Load the staged file into the table (and partition)
    async fn load_file(&self, request: &LoadRequest<'_>) -> Result<()>;
}

/// Load a staged file: optional drop, optional create, then load.
///
/// With neither `create` nor `recreate` the table must already exist;
/// otherwise `TableNotFound` is returned before anything is written.
pub async fn load_staged_file(warehouse: &dyn Warehouse, request: &LoadRequest<'_>) -> Result<()> {
    let options = request.options;

    if !options.creates_table() && !warehouse.table_exists(request.table).await? {
        return Err(Error::table_not_found(request.table));
    }

    if options.recreate {
        tracing::info!("Dropping table {}", request.table);
        warehouse.drop_table(request.table).await?;
    }

    if options.creates_table() {
        tracing::info!("Creating table {} if not exists", request.table);
        warehouse.create_table(request).await?;
    }

    if options.partition.is_empty() {
        tracing::info!("Loading {} into {}", request.path.display(), request.table);
    } else {
        let partition = options
            .partition
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("/");
        tracing::info!(
            "Loading {} into {} partition {}",
            request.path.display(),
            request.table,
            partition
        );
    }
    warehouse.load_file(request).await
}

/// Build the warehouse for a destination connection
pub fn warehouse_for(def: &ConnectionDef) -> Result<Box<dyn Warehouse>> {
    match def {
        ConnectionDef::HiveCli(hive) => Ok(Box::new(HiveCli::new(hive.clone()))),
        ConnectionDef::Duckdb(duck) => {
            if duck.attach.is_some() {
                return Err(Error::invalid_value(
                    "destination connection",
                    "a DuckDB destination cannot attach an external database",
                ));
            }
            Ok(Box::new(DuckDbWarehouse::open(&duck.path)?))
        }
        ConnectionDef::Mysql(_) => Err(Error::invalid_value(
            "destination connection",
            "mysql connections can only be used as a source",
        )),
    }
}

#[cfg(test)]
mod tests;
