//! Schema inference module
//!
//! Turns cursor metadata into the destination column list.
//!
//! # Overview
//!
//! - **Column descriptors**: name + source type code, in result order
//! - **Type mapping**: fixed source-type -> Hive-type table with a `STRING` fallback
//! - **Field dictionary**: ordered column -> destination type map used for DDL

mod mapping;
mod types;

pub use mapping::{field_dict, map_type, DEFAULT_TYPE, TYPE_MAP};
pub use types::{ColumnDescriptor, FieldType};
