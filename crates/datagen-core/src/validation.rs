use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::{Reference, TableSchemas, parse_table_schemas, value_kind};

const SUPPORTED_TYPES: [&str; 7] = [
    "string", "integer", "number", "boolean", "array", "object", "ref",
];
const KNOWN_FORMATS: [&str; 8] = [
    "email",
    "uuid",
    "date",
    "datetime",
    "date-time",
    "name",
    "uri",
    "url",
];

/// A single validation finding located by a dotted path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors block generation; warnings describe nodes that generate but
/// probably not the way the author intended.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse into a `Result`, joining every error into one message.
    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = self
            .errors
            .iter()
            .map(ValidationIssue::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::InvalidSchema(message))
    }

    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn warning(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.into(),
        });
    }

    fn extend(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Validate a single schema node and everything nested in it.
pub fn validate_schema(node: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_node(node, "$", &mut report);
    report
}

/// Validate a `{ "table": schema, ... }` document.
///
/// Besides per-node checks this requires every table to be an object node and
/// runs [`check_references`] when the document parses.
pub fn validate_table_schemas(document: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(tables) = document.as_object() else {
        report.error(
            "$",
            format!("table schemas must be an object, got {}", value_kind(document)),
        );
        return report;
    };
    if tables.is_empty() {
        report.error("$", "no tables defined");
        return report;
    }

    for (table, schema) in tables {
        if schema.get("type").and_then(Value::as_str) != Some("object") {
            report.error(table, "table schema must be of type 'object'");
        }
        validate_node(schema, table, &mut report);
    }

    if report.is_valid()
        && let Ok(parsed) = parse_table_schemas(document)
    {
        report.extend(check_references(&parsed));
    }
    report
}

/// Check `ref` targets against the tables of a batch.
///
/// A missing column on an in-batch table is an error. A table outside the
/// batch is a warning: its rows may be supplied by the caller.
pub fn check_references(tables: &TableSchemas) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (table, schema) in tables {
        for reference in schema.references() {
            let Reference {
                table: target,
                column,
            } = &reference;
            match tables.get(target) {
                Some(target_schema) => {
                    if !target_schema.columns().any(|(name, _)| name == column) {
                        report.error(
                            table,
                            format!("reference '{reference}' targets unknown column '{column}'"),
                        );
                    }
                }
                None => report.warning(
                    table,
                    format!("reference '{reference}' targets table '{target}' outside this batch"),
                ),
            }
        }
    }

    report
}

fn validate_node(node: &Value, path: &str, report: &mut ValidationReport) {
    let Some(map) = node.as_object() else {
        report.error(
            path,
            format!("schema node must be an object, got {}", value_kind(node)),
        );
        return;
    };

    let has_literal = map.contains_key("default") || map.contains_key("enum");
    if let Some(values) = map.get("enum") {
        match values.as_array() {
            Some(values) if values.is_empty() => report.error(path, "enum must not be empty"),
            Some(_) => {}
            None => report.error(path, "enum must be an array"),
        }
    }

    let node_type = match map.get("type") {
        Some(Value::String(node_type)) => node_type.as_str(),
        Some(other) => {
            report.error(
                path,
                format!("type must be a string, got {}", value_kind(other)),
            );
            return;
        }
        None if has_literal => return,
        None => {
            report.error(path, "schema node must have a 'type' property");
            return;
        }
    };

    if !SUPPORTED_TYPES.contains(&node_type) {
        if has_literal {
            report.warning(
                path,
                format!("unsupported type '{node_type}' is ignored, values come from enum/default"),
            );
        } else {
            report.error(path, format!("unsupported schema type '{node_type}'"));
        }
        return;
    }

    if map.get("unique").and_then(Value::as_bool) == Some(true) {
        let format = map.get("format").and_then(Value::as_str);
        if !matches!(format, Some("email" | "uuid")) {
            report.warning(path, "unique is only honored for email and uuid formats");
        }
    }

    match node_type {
        "string" => {
            check_bounds(map, path, "minLength", "maxLength", report);
            if let Some(format) = map.get("format") {
                match format.as_str() {
                    Some(format) if KNOWN_FORMATS.contains(&format) => {}
                    Some(format) => report.warning(
                        path,
                        format!("unknown format '{format}' falls back to pattern or word"),
                    ),
                    None => report.error(path, "format must be a string"),
                }
            }
            if let Some(pattern) = map.get("pattern")
                && !pattern.is_string()
            {
                report.error(path, "pattern must be a string");
            }
        }
        "integer" | "number" => {
            let minimum = numeric(map, path, "minimum", report);
            let maximum = numeric(map, path, "maximum", report);
            if let (Some(min), Some(max)) = (minimum, maximum)
                && min > max
            {
                report.error(
                    path,
                    format!("minimum ({min}) must be <= maximum ({max})"),
                );
            }
        }
        "array" => {
            check_bounds(map, path, "minItems", "maxItems", report);
            match map.get("items") {
                Some(items) => validate_node(items, &format!("{path}.items"), report),
                None if has_literal => {}
                None => report.error(path, "array schema must have 'items'"),
            }
        }
        "object" => match map.get("properties") {
            Some(Value::Object(properties)) => {
                if properties.is_empty() {
                    report.warning(path, "object has no properties, generates empty records");
                }
                for (name, property) in properties {
                    validate_node(property, &format!("{path}.{name}"), report);
                }
            }
            Some(other) => report.error(
                path,
                format!("properties must be an object, got {}", value_kind(other)),
            ),
            None => report.warning(path, "object has no properties, generates empty records"),
        },
        "ref" => match map.get("ref").and_then(Value::as_str) {
            Some(target) => {
                if let Err(err) = Reference::parse(target) {
                    report.error(path, err.to_string());
                }
            }
            None => report.error(path, "reference schema must have a 'ref' property"),
        },
        _ => {}
    }

    if map.get("primary_key").and_then(Value::as_bool) == Some(true)
        && matches!(node_type, "array" | "object" | "ref")
    {
        report.warning(
            path,
            format!("primary_key on a {node_type} node generates a string key"),
        );
    }
}

fn check_bounds(
    map: &Map<String, Value>,
    path: &str,
    min_key: &str,
    max_key: &str,
    report: &mut ValidationReport,
) {
    let min = non_negative(map, path, min_key, report);
    let max = non_negative(map, path, max_key, report);
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        report.error(
            path,
            format!("{min_key} ({min}) must be <= {max_key} ({max})"),
        );
    }
}

fn non_negative(
    map: &Map<String, Value>,
    path: &str,
    key: &str,
    report: &mut ValidationReport,
) -> Option<u64> {
    let value = map.get(key)?;
    match value.as_u64() {
        Some(value) => Some(value),
        None => {
            report.error(path, format!("{key} must be a non-negative integer"));
            None
        }
    }
}

fn numeric(
    map: &Map<String, Value>,
    path: &str,
    key: &str,
    report: &mut ValidationReport,
) -> Option<f64> {
    let value = map.get(key)?;
    match value.as_f64() {
        Some(value) => Some(value),
        None => {
            report.error(path, format!("{key} must be a number"));
            None
        }
    }
}
