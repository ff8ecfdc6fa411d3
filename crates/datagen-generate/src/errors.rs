use thiserror::Error;

/// Errors emitted by the generation engine.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Schema(#[from] datagen_core::Error),
    #[error("schema for table '{table}' is invalid: {source}")]
    TableSchema {
        table: String,
        #[source]
        source: datagen_core::Error,
    },
    #[error("cannot resolve reference '{reference}': {reason}")]
    UnresolvedReference { reference: String, reason: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("count {count} for table '{table}' exceeds the limit of {limit} records")]
    CountLimit { table: String, count: u64, limit: u64 },
    #[error("pattern '{pattern}' uses unsupported syntax")]
    UnsupportedPattern { pattern: String },
    #[error("error generating record {index} for table '{table}': {source}")]
    Record {
        table: String,
        index: u64,
        #[source]
        source: Box<GenerationError>,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
