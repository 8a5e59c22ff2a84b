//! Warehouse load types

use crate::error::{Error, Result};
use crate::stage::StagingFormat;
use crate::types::{FieldDict, PartitionSpec, TableProperties};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Check that a name is a plain identifier (letters, digits, underscore)
pub fn validate_identifier(field: &str, name: &str) -> Result<()> {
    if IDENTIFIER_REGEX.is_match(name) {
        Ok(())
    } else {
        Err(Error::invalid_value(
            field,
            format!("'{name}' is not a valid identifier"),
        ))
    }
}

// ============================================================================
// Table Name
// ============================================================================

/// Destination table, optionally qualified by database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    pub database: Option<String>,
    pub name: String,
}

impl TableName {
    /// Parse `table` or `database.table`
    pub fn parse(qualified: &str) -> Result<Self> {
        let qualified = qualified.trim();
        let (database, name) = match qualified.split_once('.') {
            Some((database, name)) => (Some(database), name),
            None => (None, qualified),
        };

        if let Some(database) = database {
            validate_identifier("hive_table", database)?;
        }
        validate_identifier("hive_table", name)?;

        Ok(Self {
            database: database.map(String::from),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(database) => write!(f, "{database}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// ============================================================================
// Load Options
// ============================================================================

/// How the staged data is materialized in the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Create the table if it does not exist
    #[serde(default = "default_true")]
    pub create: bool,

    /// Drop and recreate the table on every run
    #[serde(default)]
    pub recreate: bool,

    /// Replace the partition (or table) contents instead of appending
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Static partition to load into
    #[serde(default, deserialize_with = "crate::types::string_map")]
    pub partition: PartitionSpec,

    /// Table properties applied on creation
    #[serde(default, deserialize_with = "crate::types::opt_string_map")]
    pub tblproperties: Option<TableProperties>,
}

fn default_true() -> bool {
    true
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            create: true,
            recreate: false,
            overwrite: true,
            partition: PartitionSpec::new(),
            tblproperties: None,
        }
    }
}

impl LoadOptions {
    /// Whether the loader issues a CREATE TABLE
    pub fn creates_table(&self) -> bool {
        self.create || self.recreate
    }

    /// Partition column names must be plain identifiers
    pub fn validate(&self) -> Result<()> {
        for key in self.partition.keys() {
            validate_identifier("partition", key)?;
        }
        Ok(())
    }
}

// ============================================================================
// Load Request
// ============================================================================

/// Everything a warehouse needs to materialize one staged file
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    /// Staged file
    pub path: &'a Path,
    /// Destination table
    pub table: &'a TableName,
    /// Column name -> destination type, in file column order
    pub fields: &'a FieldDict,
    /// Create/recreate/partition options
    pub options: &'a LoadOptions,
    /// Format the file was staged with
    pub format: &'a StagingFormat,
}
