//! End-to-end transfer tests
//!
//! The DuckDB tests run everywhere. MySQL and Hive tests need live servers:
//! set MYSQL_TEST_URL (e.g. `mysql://root:pw@localhost:3306/test`) and/or
//! HIVE_TEST_JDBC_URL (e.g. `jdbc:hive2://localhost:10000/default`).

use duckdb::Connection;
use hive_transfer::config::{ConnectionDef, DuckDbConnectionDef, HiveCliConnectionDef};
use hive_transfer::source::{executor_for, DuckDbExecutor, MySqlExecutor, QueryExecutor};
use hive_transfer::warehouse::{warehouse_for, DuckDbWarehouse, HiveCli, TableName, Warehouse};
use hive_transfer::{run_transfer, Error, TransferConfig, TransferJob};
use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::tempdir;

fn seed_source(path: &Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (id INTEGER, name VARCHAR);
         INSERT INTO users VALUES (1, 'a,b'), (2, 'c\"d');",
    )
    .unwrap();
}

fn config_yaml(source: &Path, destination: &Path, extra: &str) -> String {
    format!(
        r#"
sql: SELECT id, name FROM users ORDER BY id
hive_table: users
delimiter: ","
source_conn_id: source
destination_conn_id: warehouse
connections:
  source:
    type: duckdb
    path: "{}"
  warehouse:
    type: duckdb
    path: "{}"
{extra}"#,
        source.display(),
        destination.display()
    )
}

async fn run_config(config: &TransferConfig) -> hive_transfer::Result<hive_transfer::TransferReport> {
    let job = TransferJob::from_config(config)?;
    let executor = executor_for(&config.source_connection()?)?;
    let warehouse = warehouse_for(&config.destination_connection()?)?;
    run_transfer(&job, executor.as_ref(), warehouse.as_ref()).await
}

fn destination_rows(path: &Path, sql: &str) -> Vec<(i64, String)> {
    let conn = Connection::open(path).unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[tokio::test]
async fn test_duckdb_to_duckdb_transfer() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.duckdb");
    let destination = dir.path().join("warehouse.duckdb");
    seed_source(&source);

    let config = TransferConfig::from_yaml(&config_yaml(&source, &destination, "")).unwrap();
    let report = run_config(&config).await.unwrap();

    assert_eq!(report.table, "users");
    assert_eq!(report.rows, 2);
    assert_eq!(
        report
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<Vec<_>>(),
        vec![("id", "BIGINT"), ("name", "STRING")]
    );
    assert_eq!(report.staged_bytes, "1,\"a,b\"\n2,\"c\"\"d\"\n".len() as u64);

    assert_eq!(
        destination_rows(&destination, "SELECT id, name FROM users ORDER BY id"),
        vec![(1, "a,b".to_string()), (2, "c\"d".to_string())]
    );

    let conn = Connection::open(&destination).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = 'users' ORDER BY ordinal_position",
        )
        .unwrap();
    let columns: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(
        columns,
        vec![
            ("id".to_string(), "BIGINT".to_string()),
            ("name".to_string(), "VARCHAR".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_recreate_and_partitions_across_runs() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.duckdb");
    let destination = dir.path().join("warehouse.duckdb");
    seed_source(&source);

    let recreate = TransferConfig::from_yaml(&config_yaml(
        &source,
        &destination,
        "recreate: true\npartition:\n  ds: '2024-01-01'\n",
    ))
    .unwrap();
    run_config(&recreate).await.unwrap();
    run_config(&recreate).await.unwrap();

    let next_day = TransferConfig::from_yaml(&config_yaml(
        &source,
        &destination,
        "partition:\n  ds: '2024-01-02'\n",
    ))
    .unwrap();
    run_config(&next_day).await.unwrap();

    assert_eq!(
        destination_rows(
            &destination,
            "SELECT COUNT(*), ds FROM users GROUP BY ds ORDER BY ds"
        ),
        vec![(2, "2024-01-01".to_string()), (2, "2024-01-02".to_string())]
    );
}

#[tokio::test]
async fn test_missing_destination_table_without_create() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.duckdb");
    let destination = dir.path().join("warehouse.duckdb");
    seed_source(&source);

    let config =
        TransferConfig::from_yaml(&config_yaml(&source, &destination, "create: false\n")).unwrap();
    let err = run_config(&config).await.unwrap_err();
    assert!(matches!(err, Error::TableNotFound { .. }));

    let warehouse = DuckDbWarehouse::open(&destination.to_string_lossy()).unwrap();
    assert!(!warehouse
        .table_exists(&TableName::parse("users").unwrap())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_connection_from_environment() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("source.duckdb");
    seed_source(&source);

    std::env::set_var(
        "HIVE_TRANSFER_CONN_ENV_SOURCE_IT",
        format!("duckdb://{}", source.display()),
    );
    let mut config = TransferConfig::new("SELECT id, name FROM users", "users");
    config.source_conn_id = "env_source_it".to_string();

    match config.source_connection().unwrap() {
        ConnectionDef::Duckdb(def) => assert_eq!(def.path, source.to_string_lossy()),
        other => panic!("unexpected connection {other:?}"),
    }

    let executor = executor_for(&config.source_connection().unwrap()).unwrap();
    let columns = executor.describe(&config.sql).await.unwrap();
    assert_eq!(columns.len(), 2);
}

// ============================================================================
// Live servers
// ============================================================================

#[tokio::test]
async fn test_mysql_source() {
    let Ok(url) = std::env::var("MYSQL_TEST_URL") else {
        println!("Skipping: MYSQL_TEST_URL not set");
        return;
    };

    let executor = MySqlExecutor::new(&hive_transfer::config::DatabaseConnectionDef {
        connection_string: Some(url),
        ..Default::default()
    })
    .unwrap();
    executor.check().await.unwrap();

    let warehouse = DuckDbWarehouse::in_memory().unwrap();
    let job = TransferJob::new(
        "SELECT CAST(1 AS SIGNED) AS id, 'a,b' AS name, CAST(NULL AS CHAR) AS missing",
        TableName::parse("mysql_it").unwrap(),
    );
    let report = run_transfer(&job, &executor, &warehouse).await.unwrap();

    assert_eq!(report.rows, 1);
    assert_eq!(report.fields.get("id").map(String::as_str), Some("DECIMAL(38,0)"));
    assert_eq!(report.fields.get("name").map(String::as_str), Some("STRING"));
}

#[tokio::test]
async fn test_hive_destination() {
    let Ok(jdbc_url) = std::env::var("HIVE_TEST_JDBC_URL") else {
        println!("Skipping: HIVE_TEST_JDBC_URL not set");
        return;
    };

    let warehouse = HiveCli::new(HiveCliConnectionDef {
        use_beeline: true,
        jdbc_url: Some(jdbc_url),
        ..HiveCliConnectionDef::default()
    });
    warehouse.check().await.unwrap();

    let executor = DuckDbExecutor::new(DuckDbConnectionDef {
        path: ":memory:".to_string(),
        attach: None,
    });
    let table = TableName::parse("hive_transfer_it").unwrap();
    let mut job = TransferJob::new("SELECT 1 AS id, 'a,b' AS name", table.clone());
    job.load.recreate = true;

    let report = run_transfer(&job, &executor, &warehouse).await.unwrap();
    assert_eq!(report.rows, 1);
    assert!(warehouse.table_exists(&table).await.unwrap());

    warehouse.drop_table(&table).await.unwrap();
}
