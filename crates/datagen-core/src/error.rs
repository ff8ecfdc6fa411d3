use thiserror::Error;

/// Core error type shared across datagen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema node is structurally invalid.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// The node declares a `type` outside the supported set.
    #[error("unsupported schema type: {0}")]
    UnsupportedType(String),
    /// A `ref` attribute is missing or not of the form `Table.column`.
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

/// Convenience alias for results returned by datagen crates.
pub type Result<T> = std::result::Result<T, Error>;
