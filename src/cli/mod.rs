//! CLI module
//!
//! Command-line interface for running transfers.
//!
//! # Commands
//!
//! - `run` - Run the query and load the result into the destination table
//! - `plan` - Show the field mapping and HiveQL without writing anything
//! - `check` - Test source and destination connections

mod commands;
mod runner;

pub use commands::{Cli, Commands, JobOverrides, OutputFormat};
pub use runner::{log_filter, Runner};
