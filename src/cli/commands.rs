//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Transfer the result of a SQL query into a Hive table
#[derive(Parser, Debug)]
#[command(name = "hive-transfer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Transfer configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
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

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the transfer
    Run {
        #[command(flatten)]
        overrides: JobOverrides,

        /// Drop and recreate the destination table
        #[arg(long)]
        recreate: bool,

        /// Do not create the destination table; it must already exist
        #[arg(long)]
        no_create: bool,

        /// Append to the table or partition instead of replacing it
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Show the field mapping and the HiveQL a run would issue
    Plan {
        #[command(flatten)]
        overrides: JobOverrides,
    },

    /// Test source and destination connections
    Check,
}

/// Settings that override the config file
#[derive(clap::Args, Debug, Default, Clone)]
pub struct JobOverrides {
    /// Query to run against the source
    #[arg(long)]
    pub sql: Option<String>,

    /// Destination table (`table` or `database.table`)
    #[arg(long)]
    pub table: Option<String>,

    /// Static partition value (repeatable)
    #[arg(long = "partition", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub partition: Vec<(String, String)>,

    /// Source connection id
    #[arg(long)]
    pub source_conn_id: Option<String>,

    /// Destination connection id
    #[arg(long)]
    pub destination_conn_id: Option<String>,
}

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
