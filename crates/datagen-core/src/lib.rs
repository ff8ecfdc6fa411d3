//! Core contracts and helpers for datagen.
//!
//! This crate defines the schema language consumed by the generation engine,
//! the normalizer for introspected schemas, schema validation, and the
//! dependency ordering between tables.

pub mod error;
pub mod graph;
pub mod normalize;
pub mod schema;
pub mod validation;

pub use error::{Error, Result};
pub use graph::{
    DependencyReport, DependencySummary, build_dependency_report, determine_generation_order,
};
pub use normalize::normalize;
pub use schema::{
    ArraySpec, NodeKind, NumericSpec, ObjectSpec, RawSchemaNode, RefSpec, Reference, SchemaNode,
    StringFormat, StringSpec, TableSchemas, parse_table_schemas,
};
pub use validation::{
    ValidationIssue, ValidationReport, check_references, validate_schema, validate_table_schemas,
};

/// Default table name used when a single schema is generated on its own.
pub const DEFAULT_TABLE_NAME: &str = "Data";
