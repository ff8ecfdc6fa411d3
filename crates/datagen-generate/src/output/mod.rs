//! Writers for generated tables.

pub mod csv;
pub mod json;
pub mod sql;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::engine::GenerationResult;
use crate::errors::GenerationError;
use crate::foreign::Record;
use crate::model::GenerationReport;

/// File name of the run report written next to the tables.
pub const REPORT_FILE: &str = "generation_report.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
    Sql,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Sql => "sql",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = GenerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "sql" => Ok(Self::Sql),
            other => Err(GenerationError::InvalidInput(format!(
                "unsupported output format '{other}', expected json, csv or sql"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A file produced by [`write_dataset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Write one file per table plus the run report into `dir`.
pub fn write_dataset(
    dir: &Path,
    format: OutputFormat,
    result: &GenerationResult,
) -> Result<Vec<WrittenFile>, GenerationError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(result.data.len() + 1);

    for (table, rows) in &result.data {
        let path = dir.join(format!("{table}.{}", format.extension()));
        let bytes = write_table(format, &path, table, rows)?;
        info!(table = %table, path = %path.display(), bytes, "table written");
        written.push(WrittenFile { path, bytes });
    }

    written.push(write_report(dir, &result.report)?);
    Ok(written)
}

/// Write the run report as `generation_report.json` into `dir`.
pub fn write_report(dir: &Path, report: &GenerationReport) -> Result<WrittenFile, GenerationError> {
    let path = dir.join(REPORT_FILE);
    let encoded = serde_json::to_vec_pretty(report)?;
    std::fs::write(&path, &encoded)?;
    Ok(WrittenFile {
        path,
        bytes: encoded.len() as u64,
    })
}

/// Write `rows` of `table` to `path` in `format`, returning bytes written.
pub fn write_table(
    format: OutputFormat,
    path: &Path,
    table: &str,
    rows: &[Record],
) -> Result<u64, GenerationError> {
    match format {
        OutputFormat::Json => json::write_table_json(path, rows),
        OutputFormat::Csv => Ok(csv::write_table_csv(path, rows)?),
        OutputFormat::Sql => sql::write_table_sql(path, table, rows),
    }
}

/// Flatten nested objects into `parent_child` keys; arrays become
/// comma-separated text.
pub fn flatten_record(record: &Record) -> Vec<(String, Value)> {
    let mut out = Vec::with_capacity(record.len());
    flatten_into(record, None, &mut out);
    out
}

fn flatten_into(record: &Record, parent: Option<&str>, out: &mut Vec<(String, Value)>) {
    for (key, value) in record {
        let key = match parent {
            Some(parent) => format!("{parent}_{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(nested, Some(&key), out),
            Value::Array(items) => {
                let joined = items.iter().map(plain_text).collect::<Vec<_>>().join(",");
                out.push((key, Value::String(joined)));
            }
            other => out.push((key, other.clone())),
        }
    }
}

/// Text form of a value without JSON quoting for strings.
pub(crate) fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Counts bytes passed through to the inner writer.
pub(crate) struct CountingWriter<W: Write> {
    inner: W,
    bytes: u64,
}

impl<W: Write> CountingWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    pub(crate) fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let size = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(size as u64);
        Ok(size)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
