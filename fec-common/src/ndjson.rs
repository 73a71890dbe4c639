//! NDJSON and JSON table I/O
//!
//! Raw partitions are append-only NDJSON. Warehouse tables are JSON array
//! documents; the reader accepts either shape.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::{Error, Result};

/// Append one line per row; no file is created for an empty slice
pub fn append_ndjson(path: &Path, rows: &[Value]) -> Result<usize> {
    if rows.is_empty() {
        return Ok(0);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for row in rows {
        serde_json::to_writer(&mut writer, row)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(rows.len())
}

/// Read every parseable line; malformed lines are logged and dropped
pub fn read_ndjson(path: &Path) -> Result<Vec<Value>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => rows.push(v),
            Err(e) => tracing::warn!(
                file = %path.display(),
                line = index + 1,
                error = %e,
                "Dropping malformed NDJSON line"
            ),
        }
    }

    Ok(rows)
}

/// Pretty JSON written to `<path>.tmp` then renamed over `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);

    {
        let file = std::fs::File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Rows of a table file stored either as a JSON array or as NDJSON
pub fn read_table_values(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path)?;
    let trimmed = text.trim_start();
    if trimmed.starts_with('[') {
        match serde_json::from_str::<Value>(trimmed)? {
            Value::Array(rows) => Ok(rows),
            _ => Err(Error::InvalidInput(format!(
                "{} is not a JSON array",
                path.display()
            ))),
        }
    } else {
        read_ndjson(path)
    }
}

/// Typed table rows; rows that do not match `T` are logged and dropped
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for (index, row) in read_table_values(path)?.into_iter().enumerate() {
        match serde_json::from_value::<T>(row) {
            Ok(v) => out.push(v),
            Err(e) => tracing::warn!(
                file = %path.display(),
                row = index,
                error = %e,
                "Dropping malformed table row"
            ),
        }
    }
    Ok(out)
}
