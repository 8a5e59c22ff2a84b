//! Tests for the warehouse module

use super::*;
use crate::stage::{StagedFile, StagingFormat, StagingWriter};
use crate::types::{FieldDict, PartitionSpec, TableProperties};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Mutex;

fn fields(pairs: &[(&str, &str)]) -> FieldDict {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn partition(pairs: &[(&str, &str)]) -> PartitionSpec {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn stage(rows: &[&[Option<&str>]]) -> StagedFile {
    let mut writer = StagingWriter::create(&StagingFormat::default(), None).unwrap();
    for row in rows {
        let row: Vec<Option<String>> = row.iter().map(|v| v.map(String::from)).collect();
        writer.write_row(&row).unwrap();
    }
    writer.finish().unwrap()
}

// ============================================================================
// HiveQL
// ============================================================================

#[test]
fn test_create_table_hql() {
    let table = TableName::parse("t").unwrap();
    let hql = hql::create_table(
        &table,
        &fields(&[("id", "BIGINT"), ("name", "STRING")]),
        &PartitionSpec::new(),
        &StagingFormat::default(),
        None,
    );

    assert_eq!(
        hql,
        "CREATE TABLE IF NOT EXISTS t (\n    `id` BIGINT,\n    `name` STRING)\n\
         ROW FORMAT DELIMITED\n\
         FIELDS TERMINATED BY '\\001'\n\
         STORED AS textfile\n;"
    );
}

#[test]
fn test_create_table_hql_with_partition_and_properties() {
    let table = TableName::parse("staging.users").unwrap();
    let mut properties = TableProperties::new();
    properties.insert("creator".to_string(), "etl".to_string());
    properties.insert("note".to_string(), "it's".to_string());
    let format = StagingFormat::new()
        .with_delimiter(',')
        .with_escape_char('\\');

    let hql = hql::create_table(
        &table,
        &fields(&[("id", "BIGINT")]),
        &partition(&[("ds", "2024-01-01"), ("hour", "7")]),
        &format,
        Some(&properties),
    );

    assert_eq!(
        hql,
        "CREATE TABLE IF NOT EXISTS staging.users (\n    `id` BIGINT)\n\
         PARTITIONED BY (ds STRING,\n    hour STRING)\n\
         ROW FORMAT DELIMITED\n\
         FIELDS TERMINATED BY ','\n\
         ESCAPED BY '\\\\'\n\
         STORED AS textfile\n\
         TBLPROPERTIES('creator'='etl', 'note'='it\\'s')\n;"
    );
}

#[test]
fn test_empty_tblproperties_are_omitted() {
    let table = TableName::parse("t").unwrap();
    let hql = hql::create_table(
        &table,
        &fields(&[("id", "INT")]),
        &PartitionSpec::new(),
        &StagingFormat::default(),
        Some(&TableProperties::new()),
    );
    assert!(!hql.contains("TBLPROPERTIES"));
}

#[test]
fn test_load_data_hql() {
    let table = TableName::parse("db.t").unwrap();
    let path = Path::new("/tmp/hive_transfer_x.csv");

    assert_eq!(
        hql::load_data(path, &table, &PartitionSpec::new(), true),
        "LOAD DATA LOCAL INPATH '/tmp/hive_transfer_x.csv' OVERWRITE INTO TABLE db.t;\n"
    );
    assert_eq!(
        hql::load_data(path, &table, &partition(&[("ds", "2024-01-01")]), false),
        "LOAD DATA LOCAL INPATH '/tmp/hive_transfer_x.csv' INTO TABLE db.t PARTITION (ds='2024-01-01');\n"
    );
}

#[test]
fn test_show_tables_hql() {
    assert_eq!(
        hql::show_tables(&TableName::parse("t").unwrap()),
        "SHOW TABLES LIKE 't';\n"
    );
    assert_eq!(
        hql::show_tables(&TableName::parse("db.t").unwrap()),
        "SHOW TABLES IN db LIKE 't';\n"
    );
}

fn plan_for(options: &LoadOptions) -> Vec<String> {
    let table = TableName::parse("t").unwrap();
    let fields = fields(&[("id", "BIGINT")]);
    let format = StagingFormat::default();
    hql::plan(&LoadRequest {
        path: Path::new("/tmp/x.csv"),
        table: &table,
        fields: &fields,
        options,
        format: &format,
    })
}

#[test]
fn test_plan_follows_options() {
    let statements = plan_for(&LoadOptions::default());
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS"));
    assert!(statements[1].starts_with("LOAD DATA"));

    let statements = plan_for(&LoadOptions {
        recreate: true,
        ..LoadOptions::default()
    });
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "DROP TABLE IF EXISTS t;\n");

    let statements = plan_for(&LoadOptions {
        create: false,
        ..LoadOptions::default()
    });
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_hql_char() {
    assert_eq!(hql::hql_char('\x01'), "\\001");
    assert_eq!(hql::hql_char('\t'), "\\011");
    assert_eq!(hql::hql_char(','), ",");
    assert_eq!(hql::hql_char('\''), "\\'");
}

#[test]
fn test_table_name_parse() {
    let table = TableName::parse("staging.users").unwrap();
    assert_eq!(table.database.as_deref(), Some("staging"));
    assert_eq!(table.name, "users");
    assert_eq!(table.to_string(), "staging.users");

    assert!(TableName::parse("users; DROP TABLE x").is_err());
    assert!(TableName::parse("a.b.c").is_err());
    assert!(TableName::parse("").is_err());
}

// ============================================================================
// Loader sequence
// ============================================================================

/// Records the calls the loader makes
struct RecordingWarehouse {
    exists: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingWarehouse {
    fn new(exists: bool) -> Self {
        Self {
            exists,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    fn system(&self) -> &'static str {
        "recording"
    }

    async fn check(&self) -> Result<()> {
        Ok(())
    }

    async fn table_exists(&self, _table: &TableName) -> Result<bool> {
        self.record("exists");
        Ok(self.exists)
    }

    async fn drop_table(&self, _table: &TableName) -> Result<()> {
        self.record("drop");
        Ok(())
    }

    async fn create_table(&self, _request: &LoadRequest<'_>) -> Result<()> {
        self.record("create");
        Ok(())
    }

    async fn load_file(&self, _request: &LoadRequest<'_>) -> Result<()> {
        self.record("load");
        Ok(())
    }
}

async fn run_loader(warehouse: &RecordingWarehouse, options: &LoadOptions) -> Result<()> {
    let table = TableName::parse("t").unwrap();
    let fields = fields(&[("id", "BIGINT")]);
    let format = StagingFormat::default();
    let request = LoadRequest {
        path: Path::new("/tmp/x.csv"),
        table: &table,
        fields: &fields,
        options,
        format: &format,
    };
    load_staged_file(warehouse, &request).await
}

#[tokio::test]
async fn test_loader_create() {
    let warehouse = RecordingWarehouse::new(false);
    run_loader(&warehouse, &LoadOptions::default()).await.unwrap();
    assert_eq!(warehouse.calls(), vec!["create", "load"]);
}

#[tokio::test]
async fn test_loader_recreate() {
    let warehouse = RecordingWarehouse::new(true);
    let options = LoadOptions {
        recreate: true,
        ..LoadOptions::default()
    };
    run_loader(&warehouse, &options).await.unwrap();
    assert_eq!(warehouse.calls(), vec!["drop", "create", "load"]);
}

#[tokio::test]
async fn test_loader_recreate_without_create() {
    let warehouse = RecordingWarehouse::new(false);
    let options = LoadOptions {
        create: false,
        recreate: true,
        ..LoadOptions::default()
    };
    run_loader(&warehouse, &options).await.unwrap();
    assert_eq!(warehouse.calls(), vec!["drop", "create", "load"]);
}

#[tokio::test]
async fn test_loader_existing_table_without_create() {
    let warehouse = RecordingWarehouse::new(true);
    let options = LoadOptions {
        create: false,
        ..LoadOptions::default()
    };
    run_loader(&warehouse, &options).await.unwrap();
    assert_eq!(warehouse.calls(), vec!["exists", "load"]);
}

#[tokio::test]
async fn test_loader_missing_table_without_create() {
    let warehouse = RecordingWarehouse::new(false);
    let options = LoadOptions {
        create: false,
        ..LoadOptions::default()
    };
    let err = run_loader(&warehouse, &options).await.unwrap_err();
    assert!(matches!(err, Error::TableNotFound { .. }));
    assert_eq!(warehouse.calls(), vec!["exists"]);
}

// ============================================================================
// DuckDB warehouse
// ============================================================================

async fn load_into(
    warehouse: &DuckDbWarehouse,
    table: &str,
    fields: &FieldDict,
    options: &LoadOptions,
    staged: &StagedFile,
) -> Result<()> {
    let table = TableName::parse(table).unwrap();
    let format = StagingFormat::default();
    let request = LoadRequest {
        path: staged.path(),
        table: &table,
        fields,
        options,
        format: &format,
    };
    load_staged_file(warehouse, &request).await
}

fn count(warehouse: &DuckDbWarehouse, sql: &str) -> i64 {
    warehouse
        .with_connection(|conn| Ok(conn.query_row(sql, [], |row| row.get(0))?))
        .unwrap()
}

#[tokio::test]
async fn test_duckdb_create_and_load_typed_columns() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let fields = fields(&[
        ("id", "BIGINT"),
        ("name", "STRING"),
        ("score", "DOUBLE"),
        ("created", "TIMESTAMP"),
    ]);
    let staged = stage(&[
        &[Some("1"), Some("alice"), Some("1.5"), Some("2024-01-01 10:00:00")],
        &[Some("2"), Some("b,o\"b"), None, None],
    ]);

    load_into(&warehouse, "users", &fields, &LoadOptions::default(), &staged)
        .await
        .unwrap();

    let rows = warehouse
        .with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, score, CAST(created AS VARCHAR) FROM users ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
        .unwrap();

    assert_eq!(
        rows,
        vec![
            (
                1,
                Some("alice".to_string()),
                Some(1.5),
                Some("2024-01-01 10:00:00".to_string())
            ),
            (2, Some("b,o\"b".to_string()), None, None),
        ]
    );
}

#[tokio::test]
async fn test_duckdb_missing_table_without_create_writes_nothing() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let options = LoadOptions {
        create: false,
        ..LoadOptions::default()
    };
    let staged = stage(&[&[Some("1")]]);

    let err = load_into(&warehouse, "absent", &fields(&[("id", "BIGINT")]), &options, &staged)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::TableNotFound { .. }));
    assert!(!warehouse
        .table_exists(&TableName::parse("absent").unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_duckdb_recreate_replaces_table() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let append = LoadOptions {
        overwrite: false,
        ..LoadOptions::default()
    };
    let first = stage(&[&[Some("1"), Some("a")], &[Some("2"), Some("b")]]);
    load_into(&warehouse, "t", &fields(&[("id", "BIGINT"), ("v", "STRING")]), &append, &first)
        .await
        .unwrap();

    // New shape: the old table must be gone, not appended to
    let recreate = LoadOptions {
        recreate: true,
        overwrite: false,
        ..LoadOptions::default()
    };
    let second = stage(&[&[Some("x")]]);
    load_into(&warehouse, "t", &fields(&[("only", "STRING")]), &recreate, &second)
        .await
        .unwrap();

    assert_eq!(count(&warehouse, "SELECT COUNT(*) FROM t"), 1);
    assert_eq!(
        count(
            &warehouse,
            "SELECT COUNT(*) FROM information_schema.columns WHERE table_name = 't'"
        ),
        1
    );
}

#[tokio::test]
async fn test_duckdb_append_and_overwrite() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let fields = fields(&[("id", "INT")]);
    let staged = stage(&[&[Some("1")], &[Some("2")]]);

    let append = LoadOptions {
        overwrite: false,
        ..LoadOptions::default()
    };
    load_into(&warehouse, "t", &fields, &append, &staged).await.unwrap();
    load_into(&warehouse, "t", &fields, &append, &staged).await.unwrap();
    assert_eq!(count(&warehouse, "SELECT COUNT(*) FROM t"), 4);

    load_into(&warehouse, "t", &fields, &LoadOptions::default(), &staged)
        .await
        .unwrap();
    assert_eq!(count(&warehouse, "SELECT COUNT(*) FROM t"), 2);
}

#[tokio::test]
async fn test_duckdb_partition_overwrite_keeps_other_partitions() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let fields = fields(&[("id", "BIGINT")]);
    let options_for = |ds: &str| LoadOptions {
        partition: partition(&[("ds", ds)]),
        ..LoadOptions::default()
    };

    let three = stage(&[&[Some("1")], &[Some("2")], &[Some("3")]]);
    let one = stage(&[&[Some("9")]]);

    load_into(&warehouse, "events", &fields, &options_for("2024-01-01"), &three)
        .await
        .unwrap();
    load_into(&warehouse, "events", &fields, &options_for("2024-01-02"), &three)
        .await
        .unwrap();
    load_into(&warehouse, "events", &fields, &options_for("2024-01-01"), &one)
        .await
        .unwrap();

    assert_eq!(
        count(&warehouse, "SELECT COUNT(*) FROM events WHERE ds = '2024-01-01'"),
        1
    );
    assert_eq!(
        count(&warehouse, "SELECT COUNT(*) FROM events WHERE ds = '2024-01-02'"),
        3
    );
}

#[tokio::test]
async fn test_duckdb_partitioned_table_requires_partition() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let fields = fields(&[("id", "BIGINT")]);
    let staged = stage(&[&[Some("1")]]);

    let partitioned = LoadOptions {
        partition: partition(&[("ds", "2024-01-01")]),
        ..LoadOptions::default()
    };
    load_into(&warehouse, "events", &fields, &partitioned, &staged)
        .await
        .unwrap();

    let err = load_into(&warehouse, "events", &fields, &LoadOptions::default(), &staged)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Warehouse { .. }));
    assert_eq!(count(&warehouse, "SELECT COUNT(*) FROM events"), 1);
}

#[tokio::test]
async fn test_duckdb_schema_qualified_table_and_properties() {
    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let mut properties = TableProperties::new();
    properties.insert("creator".to_string(), "etl".to_string());
    let options = LoadOptions {
        tblproperties: Some(properties),
        ..LoadOptions::default()
    };
    let staged = stage(&[&[Some("1")]]);

    load_into(&warehouse, "analytics.events", &fields(&[("id", "BIGINT")]), &options, &staged)
        .await
        .unwrap();

    assert!(warehouse
        .table_exists(&TableName::parse("analytics.events").unwrap())
        .await
        .unwrap());
    assert!(!warehouse
        .table_exists(&TableName::parse("events").unwrap())
        .await
        .unwrap());

    let comment: String = warehouse
        .with_connection(|conn| {
            Ok(conn.query_row(
                "SELECT comment FROM duckdb_tables() WHERE schema_name = 'analytics' AND table_name = 'events'",
                [],
                |row| row.get(0),
            )?)
        })
        .unwrap();
    assert_eq!(comment, "creator=etl");
}

#[test]
fn test_warehouse_for_rejects_mysql() {
    let def = crate::config::ConnectionDef::Mysql(crate::config::DatabaseConnectionDef::default());
    assert!(matches!(
        warehouse_for(&def),
        Err(Error::InvalidConfigValue { .. })
    ));
}
