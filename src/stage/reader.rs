//! Staging file reader
//!
//! Parses a staged file back with the same rules it was written with.

use super::format::{QuotingPolicy, StagingFormat};
use crate::error::Result;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Visit every record of a staged file in order, returning the record count
pub fn read_records<F>(path: impl AsRef<Path>, format: &StagingFormat, mut visit: F) -> Result<u64>
where
    F: FnMut(Vec<String>) -> Result<()>,
{
    format.validate()?;

    if format.quoting == QuotingPolicy::None {
        return read_escaped(path.as_ref(), format, visit);
    }

    let mut reader = format.csv_reader_builder().from_path(path.as_ref())?;
    let mut count = 0;
    for record in reader.records() {
        let record = record?;
        visit(record.iter().map(String::from).collect())?;
        count += 1;
    }
    Ok(count)
}

fn read_escaped<F>(path: &Path, format: &StagingFormat, mut visit: F) -> Result<u64>
where
    F: FnMut(Vec<String>) -> Result<()>,
{
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = String::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut escaped = false;
    let mut count = 0;

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        for c in line.chars() {
            if escaped {
                field.push(c);
                escaped = false;
            } else if Some(c) == format.escape_char {
                escaped = true;
            } else if c == format.delimiter {
                record.push(std::mem::take(&mut field));
            } else if c == '\n' {
                record.push(std::mem::take(&mut field));
                visit(std::mem::take(&mut record))?;
                count += 1;
            } else {
                field.push(c);
            }
        }
    }

    // Last record without a trailing newline
    if escaped || !field.is_empty() || !record.is_empty() {
        record.push(field);
        visit(record)?;
        count += 1;
    }

    Ok(count)
}
