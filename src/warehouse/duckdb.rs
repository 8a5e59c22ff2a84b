//! DuckDB warehouse
//!
//! A local stand-in for Hive: tables are created from the same field map,
//! partition columns become trailing `VARCHAR` columns, and a load either
//! replaces the partition (overwrite) or appends to it.

use super::types::{LoadRequest, TableName};
use super::Warehouse;
use crate::error::{Error, Result};
use crate::stage::read_records;
use async_trait::async_trait;
use duckdb::{params, params_from_iter, Connection};
use std::sync::Mutex;

/// Temporary table rows are parsed into before the typed insert
const STAGE_TABLE: &str = "hive_transfer_stage";

/// DuckDB database used as a destination
pub struct DuckDbWarehouse {
    conn: Mutex<Connection>,
    path: String,
}

impl DuckDbWarehouse {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(path: &str) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| Error::connection("duckdb", format!("Failed to open {path}: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: path.to_string(),
        })
    }

    /// Fresh in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Database path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run a closure with exclusive access to the connection
    pub fn with_connection<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| Error::warehouse("DuckDB connection lock poisoned"))?;
        f(&mut conn)
    }
}

#[async_trait]
impl Warehouse for DuckDbWarehouse {
    fn system(&self) -> &'static str {
        "duckdb"
    }

    async fn check(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch("SELECT 1")
                .map_err(|e| Error::connection("duckdb", e))
        })
    }

    async fn table_exists(&self, table: &TableName) -> Result<bool> {
        self.with_connection(|conn| table_exists(conn, table))
    }

    async fn drop_table(&self, table: &TableName) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", qualified(table)))?;
            Ok(())
        })
    }

    async fn create_table(&self, request: &LoadRequest<'_>) -> Result<()> {
        self.with_connection(|conn| create_table(conn, request))
    }

    async fn load_file(&self, request: &LoadRequest<'_>) -> Result<()> {
        self.with_connection(|conn| load_file(conn, request))
    }
}

fn table_exists(conn: &Connection, table: &TableName) -> Result<bool> {
    let schema = table.database.as_deref().unwrap_or("main");
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables \
         WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?)",
        params![schema, table.name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn create_table(conn: &Connection, request: &LoadRequest<'_>) -> Result<()> {
    let table = request.table;
    if let Some(database) = &table.database {
        conn.execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS {};", quote_ident(database)))?;
    }

    let existed = table_exists(conn, table)?;

    let mut columns: Vec<String> = request
        .fields
        .iter()
        .map(|(name, hive_type)| format!("{} {}", quote_ident(name), column_type(hive_type)))
        .collect();
    columns.extend(
        request
            .options
            .partition
            .keys()
            .map(|key| format!("{} VARCHAR", quote_ident(key))),
    );

    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        qualified(table),
        columns.join(", ")
    ))?;

    // Table properties only apply to a table this call created
    if !existed {
        if let Some(properties) = request.options.tblproperties.as_ref().filter(|p| !p.is_empty()) {
            let comment = properties
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            conn.execute_batch(&format!(
                "COMMENT ON TABLE {} IS {};",
                qualified(table),
                sql_literal(&comment)
            ))?;
        }
    }

    Ok(())
}

fn load_file(conn: &mut Connection, request: &LoadRequest<'_>) -> Result<()> {
    let width = request.fields.len();
    if width == 0 {
        return Err(Error::warehouse("cannot load a result with no columns"));
    }

    let tx = conn.transaction()?;

    let stage_columns = (0..width)
        .map(|i| format!("c{i} VARCHAR"))
        .collect::<Vec<_>>()
        .join(", ");
    tx.execute_batch(&format!(
        "CREATE OR REPLACE TEMP TABLE {STAGE_TABLE} ({stage_columns});"
    ))?;

    let staged = {
        let placeholders = vec!["?"; width].join(", ");
        let mut insert = tx.prepare(&format!("INSERT INTO {STAGE_TABLE} VALUES ({placeholders})"))?;
        read_records(request.path, request.format, |record| {
            if record.len() != width {
                return Err(Error::warehouse(format!(
                    "staged record has {} fields, expected {width}",
                    record.len()
                )));
            }
            insert.execute(params_from_iter(record.iter()))?;
            Ok(())
        })?
    };

    let target = qualified(request.table);
    let partition = &request.options.partition;

    if request.options.overwrite {
        if partition.is_empty() {
            tx.execute_batch(&format!("DELETE FROM {target};"))?;
        } else {
            let predicate = partition
                .iter()
                .map(|(k, v)| format!("{} = {}", quote_ident(k), sql_literal(v)))
                .collect::<Vec<_>>()
                .join(" AND ");
            tx.execute_batch(&format!("DELETE FROM {target} WHERE {predicate};"))?;
        }
    }

    let mut select: Vec<String> = request
        .fields
        .iter()
        .enumerate()
        .map(|(i, (_, hive_type))| {
            if hive_type.eq_ignore_ascii_case("STRING") {
                format!("c{i}")
            } else {
                format!("CAST(NULLIF(c{i}, '') AS {})", column_type(hive_type))
            }
        })
        .collect();
    select.extend(partition.iter().map(|(_, v)| sql_literal(v)));

    let inserted = tx.execute(
        &format!(
            "INSERT INTO {target} SELECT {} FROM {STAGE_TABLE}",
            select.join(", ")
        ),
        [],
    )?;
    tx.execute_batch(&format!("DROP TABLE {STAGE_TABLE};"))?;
    tx.commit()?;

    tracing::debug!("Staged {} records, inserted {} rows into {}", staged, inserted, target);
    Ok(())
}

/// DuckDB column type for a Hive type name
fn column_type(hive_type: &str) -> &str {
    match hive_type.to_ascii_uppercase().as_str() {
        "STRING" => "VARCHAR",
        "INT" => "INTEGER",
        _ => hive_type,
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified(table: &TableName) -> String {
    match &table.database {
        Some(database) => format!("{}.{}", quote_ident(database), quote_ident(&table.name)),
        None => quote_ident(&table.name),
    }
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
