use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Table name -> table schema. Iteration order is lexicographic by name.
pub type TableSchemas = BTreeMap<String, SchemaNode>;

/// Wire form of a schema node as it appears in `schema.json` documents.
///
/// This is the shape produced by hand-written schemas and by database
/// introspection. It is converted into a [`SchemaNode`] before generation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawSchemaNode {
    /// One of `string`, `integer`, `number`, `boolean`, `array`, `object`, `ref`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    /// Candidate literals, picked uniformly.
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Literal returned verbatim (after coercion to `type`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minItems", default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Element schema for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Value>>,
    /// Member schemas for objects (columns for table schemas).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Value>>,
    /// Reference target in `Table.column` form.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
    /// Uniqueness hint, honored by the `email` and `uuid` formats.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
    /// Introspection metadata, ignored by generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Introspection metadata, ignored by generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parsed schema node: shared attributes plus a closed set of kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    pub default: Option<Value>,
    pub enum_values: Option<Vec<Value>>,
    pub primary_key: bool,
    pub unique: bool,
}

/// Kind-specific part of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    String(StringSpec),
    Integer(NumericSpec),
    Number(NumericSpec),
    Boolean,
    Array(ArraySpec),
    Object(ObjectSpec),
    Ref(RefSpec),
    /// Node without a usable `type`; its value comes from `default` or `enum`.
    Literal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringSpec {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    pub format: Option<StringFormat>,
}

/// Recognized string formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Uuid,
    Date,
    DateTime,
    Name,
    Uri,
    Other(String),
}

impl StringFormat {
    pub fn parse(value: &str) -> Self {
        match value {
            "email" => Self::Email,
            "uuid" => Self::Uuid,
            "date" => Self::Date,
            "datetime" | "date-time" => Self::DateTime,
            "name" => Self::Name,
            "uri" | "url" => Self::Uri,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumericSpec {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySpec {
    /// Missing `items` is reported when the array is sampled.
    pub items: Option<Box<SchemaNode>>,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectSpec {
    pub properties: BTreeMap<String, SchemaNode>,
}

/// Unparsed `ref` attribute; validated when the reference is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RefSpec {
    pub target: Option<String>,
}

impl RefSpec {
    pub fn reference(&self) -> Result<Reference> {
        let target = self.target.as_deref().ok_or_else(|| {
            Error::InvalidReference("reference schema must have a 'ref' property".to_string())
        })?;
        Reference::parse(target)
    }
}

/// Parsed `Table.column` reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Reference {
    pub table: String,
    pub column: String,
}

impl Reference {
    pub fn parse(target: &str) -> Result<Self> {
        let (table, column) = target.split_once('.').ok_or_else(|| {
            Error::InvalidReference(format!(
                "invalid reference format '{target}', expected 'Table.column'"
            ))
        })?;
        if table.is_empty() || column.is_empty() {
            return Err(Error::InvalidReference(format!(
                "invalid reference format '{target}', table and column must be non-empty"
            )));
        }
        Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl SchemaNode {
    /// Parse a node from JSON. Fails when the value is not an object, when it
    /// has neither `type` nor `enum`/`default`, or when `type` is unsupported.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidSchema(format!(
                "schema node must be a JSON object, got {}",
                value_kind(value)
            )));
        }
        let raw: RawSchemaNode = serde_json::from_value(value.clone())
            .map_err(|err| Error::InvalidSchema(err.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawSchemaNode) -> Result<Self> {
        let has_literal = raw.enum_values.is_some() || raw.default.is_some();

        let kind = match raw.node_type.as_deref() {
            None if has_literal => NodeKind::Literal,
            None => {
                return Err(Error::InvalidSchema(
                    "schema node must have a 'type' property".to_string(),
                ));
            }
            Some("string") => {
                let min_length = raw.min_length.map(to_usize);
                let max_length = raw.max_length.map(to_usize);
                if let (Some(min), Some(max)) = (min_length, max_length)
                    && min > max
                {
                    return Err(Error::InvalidSchema(format!(
                        "minLength ({min}) must be <= maxLength ({max})"
                    )));
                }
                NodeKind::String(StringSpec {
                    min_length,
                    max_length,
                    pattern: raw.pattern,
                    format: raw.format.as_deref().map(StringFormat::parse),
                })
            }
            Some("integer") => NodeKind::Integer(numeric_spec(raw.minimum, raw.maximum)?),
            Some("number") => NodeKind::Number(numeric_spec(raw.minimum, raw.maximum)?),
            Some("boolean") => NodeKind::Boolean,
            Some("array") => {
                let items = match raw.items {
                    Some(items) => Some(Box::new(Self::from_value(&items)?)),
                    None => None,
                };
                let min_items = raw.min_items.map(to_usize);
                let max_items = raw.max_items.map(to_usize);
                if let (Some(min), Some(max)) = (min_items, max_items)
                    && min > max
                {
                    return Err(Error::InvalidSchema(format!(
                        "minItems ({min}) must be <= maxItems ({max})"
                    )));
                }
                NodeKind::Array(ArraySpec {
                    items,
                    min_items,
                    max_items,
                })
            }
            Some("object") => {
                let mut properties = BTreeMap::new();
                for (name, property) in raw.properties.unwrap_or_default() {
                    let node = Self::from_value(&property).map_err(|err| {
                        Error::InvalidSchema(format!("property '{name}': {err}"))
                    })?;
                    properties.insert(name, node);
                }
                NodeKind::Object(ObjectSpec { properties })
            }
            Some("ref") => NodeKind::Ref(RefSpec {
                target: raw.reference,
            }),
            Some(_) if has_literal => NodeKind::Literal,
            Some(other) => return Err(Error::UnsupportedType(other.to_string())),
        };

        Ok(Self {
            kind,
            default: raw.default,
            enum_values: raw.enum_values,
            primary_key: raw.primary_key,
            unique: raw.unique,
        })
    }

    /// Name of the declared type, `None` for literal nodes.
    pub fn type_name(&self) -> Option<&'static str> {
        match &self.kind {
            NodeKind::String(_) => Some("string"),
            NodeKind::Integer(_) => Some("integer"),
            NodeKind::Number(_) => Some("number"),
            NodeKind::Boolean => Some("boolean"),
            NodeKind::Array(_) => Some("array"),
            NodeKind::Object(_) => Some("object"),
            NodeKind::Ref(_) => Some("ref"),
            NodeKind::Literal => None,
        }
    }

    /// Top-level columns of a table schema; empty for non-object nodes.
    pub fn columns(&self) -> impl Iterator<Item = (&String, &SchemaNode)> {
        let properties = match &self.kind {
            NodeKind::Object(spec) => Some(&spec.properties),
            _ => None,
        };
        properties.into_iter().flat_map(|properties| properties.iter())
    }

    /// Collect every well-formed reference reachable from this node, including
    /// references nested in arrays and objects.
    pub fn references(&self) -> Vec<Reference> {
        let mut out = Vec::new();
        collect_references(self, &mut out);
        out
    }
}

/// Parse a `{ "table": schema, ... }` document into table schemas.
pub fn parse_table_schemas(value: &Value) -> Result<TableSchemas> {
    let tables = value.as_object().ok_or_else(|| {
        Error::InvalidSchema("table schemas must be a JSON object keyed by table".to_string())
    })?;

    let mut out = BTreeMap::new();
    for (table, schema) in tables {
        let node = SchemaNode::from_value(schema)
            .map_err(|err| Error::InvalidSchema(format!("table '{table}': {err}")))?;
        out.insert(table.clone(), node);
    }
    Ok(out)
}

fn collect_references(node: &SchemaNode, out: &mut Vec<Reference>) {
    match &node.kind {
        NodeKind::Ref(spec) => {
            if let Ok(reference) = spec.reference() {
                out.push(reference);
            }
        }
        NodeKind::Array(spec) => {
            if let Some(items) = &spec.items {
                collect_references(items, out);
            }
        }
        NodeKind::Object(spec) => {
            for property in spec.properties.values() {
                collect_references(property, out);
            }
        }
        NodeKind::String(_)
        | NodeKind::Integer(_)
        | NodeKind::Number(_)
        | NodeKind::Boolean
        | NodeKind::Literal => {}
    }
}

fn numeric_spec(minimum: Option<f64>, maximum: Option<f64>) -> Result<NumericSpec> {
    if let (Some(min), Some(max)) = (minimum, maximum)
        && min > max
    {
        return Err(Error::InvalidSchema(format!(
            "minimum ({min}) must be <= maximum ({max})"
        )));
    }
    Ok(NumericSpec { minimum, maximum })
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
