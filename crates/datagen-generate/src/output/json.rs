use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::TableData;
use crate::errors::GenerationError;
use crate::foreign::Record;
use crate::output::CountingWriter;

/// Write records as a pretty-printed JSON array.
pub fn write_table_json(path: &Path, rows: &[Record]) -> Result<u64, GenerationError> {
    let mut writer = CountingWriter::new(BufWriter::new(File::create(path)?));
    serde_json::to_writer_pretty(&mut writer, rows)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(writer.bytes_written())
}

/// Write every table into one JSON object keyed by table name.
pub fn write_combined_json(path: &Path, data: &TableData) -> Result<u64, GenerationError> {
    let mut writer = CountingWriter::new(BufWriter::new(File::create(path)?));
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(writer.bytes_written())
}
