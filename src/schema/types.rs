//! Column metadata types

use serde::{Deserialize, Serialize};

/// Source column type, in the MySQL protocol code space.
///
/// Every source reports its columns with these codes; non-MySQL sources
/// translate their native types into the closest entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    Decimal = 0,
    Tiny = 1,
    Short = 2,
    Long = 3,
    Float = 4,
    Double = 5,
    Null = 6,
    Timestamp = 7,
    LongLong = 8,
    Int24 = 9,
    Date = 10,
    Time = 11,
    DateTime = 12,
    Year = 13,
    NewDate = 14,
    VarChar = 15,
    Bit = 16,
    Json = 245,
    NewDecimal = 246,
    Enum = 247,
    Set = 248,
    TinyBlob = 249,
    MediumBlob = 250,
    LongBlob = 251,
    Blob = 252,
    VarString = 253,
    String = 254,
    Geometry = 255,
}

const ALL_FIELD_TYPES: [FieldType; 28] = [
    FieldType::Decimal,
    FieldType::Tiny,
    FieldType::Short,
    FieldType::Long,
    FieldType::Float,
    FieldType::Double,
    FieldType::Null,
    FieldType::Timestamp,
    FieldType::LongLong,
    FieldType::Int24,
    FieldType::Date,
    FieldType::Time,
    FieldType::DateTime,
    FieldType::Year,
    FieldType::NewDate,
    FieldType::VarChar,
    FieldType::Bit,
    FieldType::Json,
    FieldType::NewDecimal,
    FieldType::Enum,
    FieldType::Set,
    FieldType::TinyBlob,
    FieldType::MediumBlob,
    FieldType::LongBlob,
    FieldType::Blob,
    FieldType::VarString,
    FieldType::String,
    FieldType::Geometry,
];

impl FieldType {
    /// Numeric protocol code
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up a type by protocol code
    pub fn from_code(code: u32) -> Option<Self> {
        ALL_FIELD_TYPES.iter().copied().find(|t| t.code() == code)
    }

    /// Translate a MySQL column type name (as reported by the driver) into a type.
    ///
    /// Accepts names like `INT`, `BIGINT UNSIGNED`, `VARCHAR`, `BOOLEAN`.
    pub fn from_mysql_name(name: &str) -> Self {
        let upper = name.trim().to_ascii_uppercase();
        let base = upper.strip_suffix(" UNSIGNED").unwrap_or(&upper);
        match base {
            "BOOLEAN" | "BOOL" | "TINYINT" => FieldType::Tiny,
            "SMALLINT" => FieldType::Short,
            "MEDIUMINT" => FieldType::Int24,
            "INT" | "INTEGER" => FieldType::Long,
            "BIGINT" => FieldType::LongLong,
            "FLOAT" => FieldType::Float,
            "DOUBLE" | "REAL" => FieldType::Double,
            "DECIMAL" | "NUMERIC" => FieldType::NewDecimal,
            "NULL" => FieldType::Null,
            "TIMESTAMP" => FieldType::Timestamp,
            "DATE" => FieldType::Date,
            "TIME" => FieldType::Time,
            "DATETIME" => FieldType::DateTime,
            "YEAR" => FieldType::Year,
            "BIT" => FieldType::Bit,
            "JSON" => FieldType::Json,
            "ENUM" => FieldType::Enum,
            "SET" => FieldType::Set,
            "TINYBLOB" | "TINYTEXT" => FieldType::TinyBlob,
            "MEDIUMBLOB" | "MEDIUMTEXT" => FieldType::MediumBlob,
            "LONGBLOB" | "LONGTEXT" => FieldType::LongBlob,
            "BLOB" | "TEXT" => FieldType::Blob,
            "VARCHAR" | "VARBINARY" => FieldType::VarString,
            "GEOMETRY" => FieldType::Geometry,
            _ => FieldType::String,
        }
    }
}

/// One result column as reported by the source cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name (or alias) in the result set
    pub name: String,
    /// Source type code
    pub type_code: u32,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, type_code: u32) -> Self {
        Self {
            name: name.into(),
            type_code,
        }
    }

    /// Descriptor for a known source type
    pub fn typed(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type.code())
    }

    /// The source type, when the code is a known one
    pub fn field_type(&self) -> Option<FieldType> {
        FieldType::from_code(self.type_code)
    }
}
