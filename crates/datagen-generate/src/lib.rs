//! Schema-driven synthetic data generation for datagen.
//!
//! This crate turns table schemas into records, generating referenced tables
//! first so `ref` columns only point at values that were actually produced.
//! Results can be written as JSON, CSV or SQL.

pub mod engine;
pub mod errors;
pub mod faker_rs;
pub mod foreign;
pub mod generators;
pub mod model;
pub mod output;
pub mod planner;
pub mod session;

pub use engine::{GenerationEngine, GenerationResult, SchemaMap, TableData};
pub use errors::GenerationError;
pub use foreign::{InMemoryReferenceStore, Record, ReferenceSource};
pub use generators::{SampleContext, Sampler};
pub use model::{
    GenerateOptions, GenerationIssue, GenerationReport, MAX_RECORDS_PER_TABLE, TableReport,
};
pub use output::{OutputFormat, WrittenFile, write_dataset, write_report};
pub use session::GenerationSession;
