//! Hive warehouse driven through the `beeline` / `hive` command line
//!
//! Each call writes its HiveQL to a temporary `.hql` file and runs the CLI
//! with `-f`. Nothing here keeps a session open between calls.

use super::hql;
use super::types::{LoadRequest, TableName};
use super::Warehouse;
use crate::config::HiveCliConnectionDef;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use tokio::process::Command;

/// Lines of stderr kept in error messages
const STDERR_TAIL_LINES: usize = 20;

/// Hive reached through its command-line client
#[derive(Debug, Clone)]
pub struct HiveCli {
    def: HiveCliConnectionDef,
}

impl HiveCli {
    pub fn new(def: HiveCliConnectionDef) -> Self {
        Self { def }
    }

    /// JDBC URL passed to beeline
    pub fn jdbc_url(&self) -> String {
        if let Some(url) = &self.def.jdbc_url {
            return url.clone();
        }
        let host = self.def.host.as_deref().unwrap_or("localhost");
        let mut url = format!("jdbc:hive2://{host}:{}/{}", self.def.port, self.def.schema);
        if let Some(auth) = &self.def.auth {
            url.push_str(&format!(";auth={auth}"));
        }
        url
    }

    fn program(&self) -> &str {
        match &self.def.executable {
            Some(executable) => executable,
            None if self.def.use_beeline => "beeline",
            None => "hive",
        }
    }

    /// `--hiveconf` settings, including the YARN queue
    fn hive_conf(&self) -> Vec<(String, String)> {
        let mut conf: Vec<(String, String)> = self
            .def
            .hive_conf
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        if let Some(queue) = &self.def.mapred_queue {
            for key in [
                "mapreduce.job.queuename",
                "mapred.job.queue.name",
                "tez.queue.name",
            ] {
                conf.push((key.to_string(), queue.clone()));
            }
        }
        conf
    }

    /// Command-line arguments for running `script`
    pub fn args(&self, script: &Path, silent: bool) -> Vec<String> {
        let mut args = Vec::new();

        if self.def.use_beeline {
            args.push("-u".to_string());
            args.push(self.jdbc_url());
            if let Some(user) = &self.def.user {
                args.push("-n".to_string());
                args.push(user.clone());
            }
            if let Some(password) = &self.def.password {
                args.push("-p".to_string());
                args.push(password.clone());
            }
            if silent {
                args.extend(
                    ["--silent=true", "--showHeader=false", "--outputformat=tsv2"]
                        .map(String::from),
                );
            }
        } else if silent {
            args.push("-S".to_string());
        }

        let conf_flag = if self.def.use_beeline {
            "--hiveconf"
        } else {
            "-hiveconf"
        };
        for (key, value) in self.hive_conf() {
            args.push(conf_flag.to_string());
            args.push(format!("{key}={value}"));
        }

        args.extend(self.def.hive_cli_params.iter().cloned());
        args.push("-f".to_string());
        args.push(script.to_string_lossy().into_owned());
        args
    }

    /// Run a HiveQL script and return its stdout
    pub async fn run_hql(&self, hql: &str, silent: bool) -> Result<String> {
        let mut script = tempfile::Builder::new()
            .prefix("hive_transfer_")
            .suffix(".hql")
            .tempfile()?;
        script.write_all(hql.as_bytes())?;
        script.flush()?;

        let program = self.program();
        let args = self.args(script.path(), silent);
        tracing::debug!("Running {} {}", program, mask_password(&args).join(" "));
        tracing::debug!("HQL:\n{}", hql);

        let output = Command::new(program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Error::connection("hive", format!("failed to start {program}: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_failure(&stderr, &output.status.to_string()))
    }
}

#[async_trait]
impl Warehouse for HiveCli {
    fn system(&self) -> &'static str {
        "hive"
    }

    async fn check(&self) -> Result<()> {
        self.run_hql("SHOW DATABASES;\n", true).await.map(|_| ())
    }

    async fn table_exists(&self, table: &TableName) -> Result<bool> {
        let stdout = self.run_hql(&hql::show_tables(table), true).await?;
        Ok(stdout_lists_table(&stdout, &table.name))
    }

    async fn drop_table(&self, table: &TableName) -> Result<()> {
        self.run_hql(&hql::drop_table(table), false).await.map(|_| ())
    }

    async fn create_table(&self, request: &LoadRequest<'_>) -> Result<()> {
        let create = hql::create_table(
            request.table,
            request.fields,
            &request.options.partition,
            request.format,
            request.options.tblproperties.as_ref(),
        );
        self.run_hql(&create, false).await.map(|_| ())
    }

    async fn load_file(&self, request: &LoadRequest<'_>) -> Result<()> {
        let load = hql::load_data(
            request.path,
            request.table,
            &request.options.partition,
            request.options.overwrite,
        );
        self.run_hql(&load, false).await.map(|_| ())
    }
}

/// Whether `SHOW TABLES` output names the table (Hive names are case-insensitive)
fn stdout_lists_table(stdout: &str, name: &str) -> bool {
    stdout
        .lines()
        .map(|line| line.trim().trim_matches('\''))
        .any(|line| line.eq_ignore_ascii_case(name))
}

/// Map a failed CLI run to a connection or warehouse error
fn classify_failure(stderr: &str, status: &str) -> Error {
    let lines: Vec<&str> = stderr.lines().collect();
    let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");

    let lower = stderr.to_ascii_lowercase();
    let unreachable = [
        "could not open",
        "connection refused",
        "unknownhostexception",
        "no route to host",
    ]
    .iter()
    .any(|needle| lower.contains(needle));

    if unreachable {
        Error::connection("hive", tail)
    } else {
        Error::warehouse(format!("hive exited with {status}: {tail}"))
    }
}

fn mask_password(args: &[String]) -> Vec<String> {
    let mut masked = args.to_vec();
    for i in 1..masked.len() {
        if masked[i - 1] == "-p" {
            masked[i] = "****".to_string();
        }
    }
    masked
}
