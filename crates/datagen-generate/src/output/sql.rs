use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use crate::errors::GenerationError;
use crate::foreign::Record;
use crate::output::{CountingWriter, flatten_record};

/// Write one `INSERT INTO` statement per record.
pub fn write_table_sql(path: &Path, table: &str, rows: &[Record]) -> Result<u64, GenerationError> {
    validate_table_name(table)?;
    let mut writer = CountingWriter::new(BufWriter::new(File::create(path)?));

    writeln!(writer, "-- SQL INSERT statements for table: {table}")?;
    writeln!(writer, "-- Generated {} records", rows.len())?;
    writeln!(writer)?;
    for row in rows {
        writeln!(writer, "{}", insert_statement(table, row))?;
    }

    writer.flush()?;
    Ok(writer.bytes_written())
}

/// Table names are limited to ASCII letters, digits, `_` and `-`.
pub fn validate_table_name(table: &str) -> Result<(), GenerationError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(GenerationError::InvalidInput(format!(
            "invalid table name '{table}' for SQL output"
        )))
    }
}

pub fn insert_statement(table: &str, row: &Record) -> String {
    let flat = flatten_record(row);
    let columns = flat
        .iter()
        .map(|(key, _)| format!("`{}`", key.replace('`', "``")))
        .collect::<Vec<_>>()
        .join(", ");
    let values = flat
        .iter()
        .map(|(_, value)| sql_literal(value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("INSERT INTO `{table}` ({columns}) VALUES ({values});")
}

fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => format!("'{}'", text.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}
