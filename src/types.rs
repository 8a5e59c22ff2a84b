//! Common types used throughout hive-transfer
//!
//! This module contains shared type definitions and type aliases
//! used across multiple modules.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};

// ============================================================================
// Type Aliases
// ============================================================================

/// One result row, rendered as text. `None` is SQL NULL.
pub type Row = Vec<Option<String>>;

/// String-to-string map that keeps insertion order.
///
/// Re-inserting an existing key replaces its value in place, so the key
/// keeps its original position.
pub type StringMap = IndexMap<String, String>;

/// Ordered column name -> destination type mapping
pub type FieldDict = StringMap;

/// Static partition spec (partition column -> literal value)
pub type PartitionSpec = StringMap;

/// Destination table properties
pub type TableProperties = StringMap;

// ============================================================================
// Config map deserialization
// ============================================================================

/// Scalar config value accepted where a string is expected (`ds: 20240101`)
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::String(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// `deserialize_with` for a [`StringMap`] whose values may be written as
/// numbers or booleans
pub fn string_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StringMap, D::Error> {
    let raw = IndexMap::<String, Scalar>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}

/// [`string_map`] for an optional map
pub fn opt_string_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<StringMap>, D::Error> {
    let raw = Option::<IndexMap<String, Scalar>>::deserialize(deserializer)?;
    Ok(raw.map(|map| map.into_iter().map(|(k, v)| (k, v.into())).collect()))
}
