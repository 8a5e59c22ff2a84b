//! HiveQL statement builders

use super::types::{LoadRequest, TableName};
use crate::stage::StagingFormat;
use crate::types::{FieldDict, PartitionSpec, TableProperties};
use std::fmt::Write as _;
use std::path::Path;

/// `DROP TABLE IF EXISTS`
pub fn drop_table(table: &TableName) -> String {
    format!("DROP TABLE IF EXISTS {table};\n")
}

/// `CREATE TABLE IF NOT EXISTS` for a delimited text table.
///
/// Partition columns are declared as `STRING`.
pub fn create_table(
    table: &TableName,
    fields: &FieldDict,
    partition: &PartitionSpec,
    format: &StagingFormat,
    tblproperties: Option<&TableProperties>,
) -> String {
    let columns = fields
        .iter()
        .map(|(name, hive_type)| format!("`{}` {hive_type}", name.trim_matches('`')))
        .collect::<Vec<_>>()
        .join(",\n    ");

    let mut hql = format!("CREATE TABLE IF NOT EXISTS {table} (\n    {columns})\n");

    if !partition.is_empty() {
        let partition_columns = partition
            .keys()
            .map(|key| format!("{key} STRING"))
            .collect::<Vec<_>>()
            .join(",\n    ");
        let _ = writeln!(hql, "PARTITIONED BY ({partition_columns})");
    }

    hql.push_str("ROW FORMAT DELIMITED\n");
    let _ = writeln!(hql, "FIELDS TERMINATED BY '{}'", hql_char(format.delimiter));
    if let Some(escape) = format.escape_char {
        let _ = writeln!(hql, "ESCAPED BY '{}'", hql_char(escape));
    }
    hql.push_str("STORED AS textfile\n");

    if let Some(properties) = tblproperties.filter(|p| !p.is_empty()) {
        let properties = properties
            .iter()
            .map(|(k, v)| format!("{}={}", quote_literal(k), quote_literal(v)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(hql, "TBLPROPERTIES({properties})");
    }

    hql.push(';');
    hql
}

/// `LOAD DATA LOCAL INPATH … INTO TABLE … [PARTITION (…)]`
pub fn load_data(path: &Path, table: &TableName, partition: &PartitionSpec, overwrite: bool) -> String {
    let mut hql = format!(
        "LOAD DATA LOCAL INPATH {} ",
        quote_literal(&path.to_string_lossy())
    );
    if overwrite {
        hql.push_str("OVERWRITE ");
    }
    let _ = write!(hql, "INTO TABLE {table}");
    if !partition.is_empty() {
        let values = partition
            .iter()
            .map(|(k, v)| format!("{k}={}", quote_literal(v)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(hql, " PARTITION ({values})");
    }
    hql.push_str(";\n");
    hql
}

/// `SHOW TABLES [IN db] LIKE 'name'`
pub fn show_tables(table: &TableName) -> String {
    match &table.database {
        Some(database) => format!("SHOW TABLES IN {database} LIKE '{}';\n", table.name),
        None => format!("SHOW TABLES LIKE '{}';\n", table.name),
    }
}

/// Every statement the loader issues for a request, in order
pub fn plan(request: &LoadRequest<'_>) -> Vec<String> {
    let options = request.options;
    let mut statements = Vec::new();
    if options.recreate {
        statements.push(drop_table(request.table));
    }
    if options.creates_table() {
        statements.push(create_table(
            request.table,
            request.fields,
            &options.partition,
            request.format,
            options.tblproperties.as_ref(),
        ));
    }
    statements.push(load_data(
        request.path,
        request.table,
        &options.partition,
        options.overwrite,
    ));
    statements
}

/// Render a single character for use inside a HiveQL string literal.
///
/// Control characters use Hive's octal form (`\001`).
pub fn hql_char(c: char) -> String {
    match c {
        '\'' => "\\'".to_string(),
        '\\' => "\\\\".to_string(),
        c if c.is_ascii_control() => format!("\\{:03o}", c as u32),
        c => c.to_string(),
    }
}

/// Single-quoted HiveQL string literal
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            c => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}
