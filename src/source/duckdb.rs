//! DuckDB source
//!
//! Queries a DuckDB file, or an external PostgreSQL / MySQL / SQLite
//! database attached read-only as `source_db` through DuckDB's extensions.

use super::{QueryExecutor, RowSink};
use crate::config::{AttachDef, DuckDbConnectionDef};
use crate::error::{Error, Result};
use crate::schema::{ColumnDescriptor, FieldType};
use async_trait::async_trait;
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_CE_DAYS: i32 = 719_163;

/// DuckDB query executor; opens one connection per call
#[derive(Debug, Clone)]
pub struct DuckDbExecutor {
    def: DuckDbConnectionDef,
}

impl DuckDbExecutor {
    pub fn new(def: DuckDbConnectionDef) -> Self {
        Self { def }
    }

    fn open(&self) -> Result<Connection> {
        let path = self.def.path.as_str();
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| Error::connection("duckdb", format!("Failed to open {path}: {e}")))?;

        if let Some(attach) = &self.def.attach {
            attach_database(&conn, attach)?;
        }
        Ok(conn)
    }
}

#[async_trait]
impl QueryExecutor for DuckDbExecutor {
    fn system(&self) -> &'static str {
        "duckdb"
    }

    async fn check(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch("SELECT 1")
            .map_err(|e| Error::connection("duckdb", e))
    }

    async fn describe(&self, sql: &str) -> Result<Vec<ColumnDescriptor>> {
        let conn = self.open()?;
        describe_on(&conn, sql)
    }

    async fn execute(&self, sql: &str, sink: &mut dyn RowSink) -> Result<u64> {
        let conn = self.open()?;
        tracing::debug!("Executing query: {}", sql);

        let columns = describe_on(&conn, sql)?;
        sink.begin(&columns)?;

        let mut stmt = conn.prepare(sql).map_err(Error::query)?;
        let mut rows = stmt.query([]).map_err(Error::query)?;
        let mut values = Vec::with_capacity(columns.len());
        let mut count = 0u64;

        while let Some(row) = rows.next().map_err(Error::query)? {
            values.clear();
            for i in 0..columns.len() {
                let value: Value = row.get(i).map_err(Error::query)?;
                values.push(render_value(value));
            }
            sink.write_row(&values)?;
            count += 1;
        }

        Ok(count)
    }
}

/// Install the engine's extension and attach it read-only as `source_db`
fn attach_database(conn: &Connection, attach: &AttachDef) -> Result<()> {
    let extension = attach.engine.extension();
    conn.execute_batch(&format!("INSTALL {extension}; LOAD {extension};"))
        .map_err(|e| {
            Error::connection("duckdb", format!("Failed to load {extension} extension: {e}"))
        })?;

    let attach_sql = format!(
        "ATTACH '{}' AS source_db (TYPE {}, READ_ONLY);",
        attach.connection_string.replace('\'', "''"),
        extension.to_ascii_uppercase()
    );
    conn.execute_batch(&attach_sql)
        .map_err(|e| Error::connection(extension, format!("Failed to attach database: {e}")))
}

fn describe_on(conn: &Connection, sql: &str) -> Result<Vec<ColumnDescriptor>> {
    let sql = sql.trim().trim_end_matches(';');
    let mut stmt = conn
        .prepare(&format!("DESCRIBE {sql}"))
        .map_err(Error::query)?;
    let columns = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let column_type: String = row.get(1)?;
            Ok(ColumnDescriptor::typed(name, field_type(&column_type)))
        })
        .map_err(Error::query)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::query)?;
    Ok(columns)
}

/// Closest MySQL type for a DuckDB column type name
fn field_type(duckdb_type: &str) -> FieldType {
    let upper = duckdb_type.trim().to_ascii_uppercase();
    if upper.ends_with(']') {
        return FieldType::String;
    }
    let base = upper.split('(').next().unwrap_or_default().trim();
    match base {
        "BOOLEAN" | "TINYINT" | "UTINYINT" => FieldType::Tiny,
        "SMALLINT" | "USMALLINT" => FieldType::Short,
        "INTEGER" | "UINTEGER" => FieldType::Long,
        "BIGINT" | "UBIGINT" | "HUGEINT" | "UHUGEINT" => FieldType::LongLong,
        "FLOAT" => FieldType::Float,
        "DOUBLE" => FieldType::Double,
        "DECIMAL" => FieldType::NewDecimal,
        "DATE" => FieldType::Date,
        "TIME" => FieldType::Time,
        "TIMESTAMP" | "TIMESTAMP WITH TIME ZONE" | "TIMESTAMP_S" | "TIMESTAMP_MS"
        | "TIMESTAMP_NS" => FieldType::Timestamp,
        "VARCHAR" => FieldType::VarString,
        "BLOB" => FieldType::Blob,
        "JSON" => FieldType::Json,
        "ENUM" => FieldType::Enum,
        _ => FieldType::String,
    }
}

/// Text rendering of a DuckDB value; `None` for NULL
fn render_value(value: Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::Boolean(b) => u8::from(b).to_string(),
        Value::TinyInt(i) => i.to_string(),
        Value::SmallInt(i) => i.to_string(),
        Value::Int(i) => i.to_string(),
        Value::BigInt(i) => i.to_string(),
        Value::HugeInt(i) => i.to_string(),
        Value::UTinyInt(i) => i.to_string(),
        Value::USmallInt(i) => i.to_string(),
        Value::UInt(i) => i.to_string(),
        Value::UBigInt(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Double(f) => f.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Text(s) | Value::Enum(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
        Value::Timestamp(unit, t) => render_timestamp(to_micros(unit, t)),
        Value::Date32(d) => chrono::NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_CE_DAYS)
            .map_or_else(|| d.to_string(), |date| date.format("%Y-%m-%d").to_string()),
        Value::Time64(unit, t) => render_time(to_micros(unit, t)),
        other => format!("{other:?}"),
    };
    Some(text)
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value * 1_000_000,
        TimeUnit::Millisecond => value * 1_000,
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

/// `YYYY-MM-DD HH:MM:SS`, with `.ffffff` only when there are microseconds
fn render_timestamp(micros: i64) -> String {
    let secs = micros.div_euclid(1_000_000);
    let sub_micros = micros.rem_euclid(1_000_000);
    match chrono::DateTime::from_timestamp(secs, (sub_micros * 1_000) as u32) {
        Some(dt) if sub_micros == 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
        None => micros.to_string(),
    }
}

fn render_time(micros: i64) -> String {
    let secs = micros / 1_000_000;
    let sub_micros = micros % 1_000_000;
    let hms = format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    );
    if sub_micros == 0 {
        hms
    } else {
        format!("{hms}.{sub_micros:06}")
    }
}
