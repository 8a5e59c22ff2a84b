// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # hive-transfer
//!
//! Moves the result of a SQL query into a Hive table.
//!
//! The query runs against the source (MySQL, or DuckDB for local work),
//! its column types are mapped to Hive types, the rows are staged in a
//! temporary delimited file and the file is loaded into the destination
//! table, creating, recreating or partitioning it as asked.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hive_transfer::{run_transfer, TransferConfig, TransferJob};
//! use hive_transfer::source::executor_for;
//! use hive_transfer::warehouse::warehouse_for;
//!
//! #[tokio::main]
//! async fn main() -> hive_transfer::Result<()> {
//!     let config = TransferConfig::from_file("transfer.yaml")?;
//!     let job = TransferJob::from_config(&config)?;
//!     let executor = executor_for(&config.source_connection()?)?;
//!     let warehouse = warehouse_for(&config.destination_connection()?)?;
//!
//!     let report = run_transfer(&job, executor.as_ref(), warehouse.as_ref()).await?;
//!     println!("{} rows loaded into {}", report.rows, report.table);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐   ┌──────────────────┐
//! │    source    │──▶│   schema    │──▶│    stage     │──▶│    warehouse     │
//! │ MySQL/DuckDB │   │ type → Hive │   │ temp CSV-ish │   │ Hive CLI/DuckDB  │
//! └──────────────┘   └─────────────┘   └──────────────┘   └──────────────────┘
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

/// Common types and type aliases
pub mod types;

/// Transfer configuration and connection definitions
pub mod config;

/// Source column types and the Hive type map
pub mod schema;

/// Query executors (MySQL, DuckDB)
pub mod source;

/// Temporary delimited staging files
pub mod stage;

/// Destination loaders (Hive CLI, DuckDB)
pub mod warehouse;

/// Query-to-table orchestration
pub mod transfer;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::TransferConfig;
pub use transfer::{run_transfer, TransferJob, TransferReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
