use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::foreign::Record;
use crate::output::{CountingWriter, flatten_record, plain_text};

/// Write records as CSV. The header is the union of flattened keys in
/// first-seen order; missing cells are empty.
pub fn write_table_csv(path: &Path, rows: &[Record]) -> Result<u64, csv::Error> {
    let writer = BufWriter::new(File::create(path).map_err(csv::Error::from)?);
    let counting = CountingWriter::new(writer);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(counting);

    let flattened: Vec<Vec<(String, serde_json::Value)>> = rows.iter().map(flatten_record).collect();
    let mut header: Vec<String> = Vec::new();
    for row in &flattened {
        for (key, _) in row {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }

    if !header.is_empty() {
        writer.write_record(&header)?;
    }
    for row in &flattened {
        let record: Vec<String> = header
            .iter()
            .map(|column| {
                row.iter()
                    .find(|(key, _)| key == column)
                    .map(|(_, value)| plain_text(value))
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }

    writer.flush()?;
    let counting = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(counting.bytes_written())
}
