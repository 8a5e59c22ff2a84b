//! Error types for hive-transfer
//!
//! This module defines the error hierarchy for the whole transfer pipeline.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Nothing in the crate retries: every error aborts the run and surfaces
//! to the caller unchanged.

use thiserror::Error;

/// The main error type for hive-transfer
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Source Errors
    // ============================================================================
    #[error("Cannot connect to {system}: {message}")]
    Connection { system: String, message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    // ============================================================================
    // Staging Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Staging error: {message}")]
    Staging { message: String },

    // ============================================================================
    // Warehouse Errors
    // ============================================================================
    #[error("Table '{table}' does not exist and neither create nor recreate is set")]
    TableNotFound { table: String },

    #[error("Warehouse error: {message}")]
    Warehouse { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a connection error for the named system
    pub fn connection(system: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            system: system.into(),
            message: message.to_string(),
        }
    }

    /// Create a query error
    pub fn query(message: impl ToString) -> Self {
        Self::Query {
            message: message.to_string(),
        }
    }

    /// Create a staging error
    pub fn staging(message: impl Into<String>) -> Self {
        Self::Staging {
            message: message.into(),
        }
    }

    /// Create a table-not-found error
    pub fn table_not_found(table: impl ToString) -> Self {
        Self::TableNotFound {
            table: table.to_string(),
        }
    }

    /// Create a warehouse error
    pub fn warehouse(message: impl ToString) -> Self {
        Self::Warehouse {
            message: message.to_string(),
        }
    }

    /// Whether an external orchestrator may reasonably retry the run.
    ///
    /// Only connectivity failures qualify; the crate itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => Error::Io(io),
                other => Error::staging(format!("{other:?}")),
            }
        } else {
            Error::staging(err.to_string())
        }
    }
}

impl From<duckdb::Error> for Error {
    fn from(err: duckdb::Error) -> Self {
        Error::warehouse(err)
    }
}

/// Result type alias for hive-transfer
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
