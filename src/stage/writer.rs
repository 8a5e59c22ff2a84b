//! Staging file writer
//!
//! Writes result rows to a temporary delimited file. The file lives behind
//! a guard that deletes it on drop, so every exit path (error, panic,
//! cancelled future) cleans it up.

use super::format::{QuotingPolicy, StagingFormat};
use crate::error::{Error, Result};
use crate::schema::ColumnDescriptor;
use crate::source::RowSink;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::{NamedTempFile, TempPath};

/// A finished, flushed and closed staging file.
///
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    rows: u64,
    bytes: u64,
}

impl StagedFile {
    /// Location of the staged file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records written
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// File size in bytes
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Delete the file now, reporting any failure
    pub fn close(self) -> Result<()> {
        self.path.close()?;
        Ok(())
    }
}

enum Output {
    /// Quoting policies handled by the csv crate
    Quoted(csv::Writer<NamedTempFile>),
    /// `QuotingPolicy::None`: unquoted, escape-prefixed fields
    Escaped(BufWriter<NamedTempFile>),
}

/// Row sink that stages rows in a temporary delimited file
pub struct StagingWriter {
    format: StagingFormat,
    output: Output,
    columns: Vec<ColumnDescriptor>,
    rows: u64,
    /// Reused per-row buffers
    fields: Vec<String>,
    line: String,
}

impl StagingWriter {
    /// Create a new staging file in `dir` (or the system temp directory)
    pub fn create(format: &StagingFormat, dir: Option<&Path>) -> Result<Self> {
        format.validate()?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("hive_transfer_").suffix(".csv");
        let file = match dir {
            Some(dir) => builder
                .tempfile_in(dir)
                .map_err(|e| create_error(&e, &dir.display().to_string()))?,
            None => builder
                .tempfile()
                .map_err(|e| create_error(&e, "the system temp directory"))?,
        };
        tracing::debug!("Staging file created at {}", file.path().display());

        let output = match format.quoting {
            QuotingPolicy::None => Output::Escaped(BufWriter::new(file)),
            _ => Output::Quoted(format.csv_writer_builder().from_writer(file)),
        };

        Ok(Self {
            format: format.clone(),
            output,
            columns: Vec::new(),
            rows: 0,
            fields: Vec::new(),
            line: String::new(),
        })
    }

    /// Columns announced by the source, in result order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Append one row
    pub fn write_row(&mut self, row: &[Option<String>]) -> Result<()> {
        if !self.columns.is_empty() && row.len() != self.columns.len() {
            return Err(Error::staging(format!(
                "row {} has {} values but the result has {} columns",
                self.rows + 1,
                row.len(),
                self.columns.len()
            )));
        }

        match &mut self.output {
            Output::Quoted(writer) => {
                self.fields.clear();
                for value in row {
                    let value = value.as_deref().unwrap_or_default();
                    // A lone escape char would swallow the next byte when read back
                    let field = match self.format.escape_char {
                        Some(escape) if value.contains(escape) => {
                            value.replace(escape, &format!("{escape}{escape}"))
                        }
                        _ => value.to_string(),
                    };
                    self.fields.push(field);
                }
                writer.write_record(&self.fields)?;
            }
            Output::Escaped(writer) => {
                self.line.clear();
                for (i, value) in row.iter().enumerate() {
                    if i > 0 {
                        self.line.push(self.format.delimiter);
                    }
                    escape_field(
                        &self.format,
                        value.as_deref().unwrap_or_default(),
                        &mut self.line,
                    )?;
                }
                self.line.push('\n');
                writer.write_all(self.line.as_bytes())?;
            }
        }

        self.rows += 1;
        Ok(())
    }

    /// Flush, sync and close the file, handing over its cleanup guard
    pub fn finish(self) -> Result<StagedFile> {
        let file = match self.output {
            Output::Quoted(writer) => writer
                .into_inner()
                .map_err(|e| flush_error(e.error()))?,
            Output::Escaped(writer) => writer
                .into_inner()
                .map_err(|e| flush_error(e.error()))?,
        };

        file.as_file().sync_all()?;
        let bytes = file.as_file().metadata()?.len();

        tracing::debug!(
            "Staged {} rows ({} bytes) in {}",
            self.rows,
            bytes,
            file.path().display()
        );

        Ok(StagedFile {
            path: file.into_temp_path(),
            rows: self.rows,
            bytes,
        })
    }
}

impl RowSink for StagingWriter {
    fn begin(&mut self, columns: &[ColumnDescriptor]) -> Result<()> {
        self.columns = columns.to_vec();
        Ok(())
    }

    fn write_row(&mut self, row: &[Option<String>]) -> Result<()> {
        StagingWriter::write_row(self, row)
    }
}

fn create_error(err: &std::io::Error, location: &str) -> Error {
    Error::Io(std::io::Error::new(
        err.kind(),
        format!("failed to create staging file in {location}: {err}"),
    ))
}

fn flush_error(err: &std::io::Error) -> Error {
    Error::Io(std::io::Error::new(
        err.kind(),
        format!("failed to flush staging file: {err}"),
    ))
}

/// Append `value` to `out`, prefixing special characters with the escape char
fn escape_field(format: &StagingFormat, value: &str, out: &mut String) -> Result<()> {
    for c in value.chars() {
        let special = c == format.delimiter
            || c == format.quote_char
            || Some(c) == format.escape_char
            || c == '\n'
            || c == '\r';
        if special {
            let Some(escape) = format.escape_char else {
                return Err(Error::staging(format!(
                    "value {value:?} needs escaping but no escape_char is set for quoting 'none'"
                )));
            };
            out.push(escape);
        }
        out.push(c);
    }
    Ok(())
}
