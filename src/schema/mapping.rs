//! Source type -> Hive type mapping

use super::types::{ColumnDescriptor, FieldType};
use crate::types::FieldDict;

/// Destination type used for every code missing from [`TYPE_MAP`]
pub const DEFAULT_TYPE: &str = "STRING";

/// Fixed source-type -> destination-type table
pub static TYPE_MAP: &[(FieldType, &str)] = &[
    (FieldType::Bit, "INT"),
    (FieldType::Decimal, "DOUBLE"),
    (FieldType::NewDecimal, "DOUBLE"),
    (FieldType::Double, "DOUBLE"),
    (FieldType::Float, "DOUBLE"),
    (FieldType::Int24, "INT"),
    (FieldType::Long, "BIGINT"),
    (FieldType::LongLong, "DECIMAL(38,0)"),
    (FieldType::Short, "INT"),
    (FieldType::Tiny, "SMALLINT"),
    (FieldType::Year, "INT"),
    (FieldType::Timestamp, "TIMESTAMP"),
];

/// Map a source type code to a destination type name. Never fails.
pub fn map_type(type_code: u32) -> &'static str {
    TYPE_MAP
        .iter()
        .find(|(field_type, _)| field_type.code() == type_code)
        .map_or(DEFAULT_TYPE, |(_, hive_type)| *hive_type)
}

/// Build the field dictionary for a result set, in column order.
///
/// A repeated column name keeps its first position and takes the later type.
pub fn field_dict(columns: &[ColumnDescriptor]) -> FieldDict {
    let mut fields = FieldDict::new();
    for column in columns {
        if fields
            .insert(column.name.clone(), map_type(column.type_code).to_string())
            .is_some()
        {
            tracing::warn!(
                "Duplicate column name '{}' in query result; the staged file will have more columns than the table",
                column.name
            );
        }
    }
    fields
}
