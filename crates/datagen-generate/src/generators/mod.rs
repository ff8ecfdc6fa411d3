//! Type-directed value generation.
//!
//! [`Sampler`] walks a [`SchemaNode`] and picks the generator for every node:
//! `default`, then `enum`, then primary keys, then the node's type.

pub mod keys;
pub mod pattern;
pub mod primitives;
pub mod semantic;

use chrono::NaiveDate;
use datagen_core::{ArraySpec, Error as SchemaError, NodeKind, ObjectSpec, SchemaNode};
use rand::{Rng, RngCore};
use serde_json::{Map, Value};

use crate::errors::GenerationError;
use crate::faker_rs::FakeRsAdapter;
use crate::model::GenerationIssue;
use crate::session::GenerationSession;

const DEFAULT_MIN_ITEMS: usize = 1;
const DEFAULT_MAX_ITEMS: usize = 3;

/// Per-row state handed down the schema tree.
pub struct SampleContext<'a> {
    pub table: &'a str,
    pub session: &'a mut GenerationSession,
    pub rng: &'a mut dyn RngCore,
}

impl<'a> SampleContext<'a> {
    pub fn new(table: &'a str, session: &'a mut GenerationSession, rng: &'a mut dyn RngCore) -> Self {
        Self {
            table,
            session,
            rng,
        }
    }

    pub(crate) fn record_usage(&mut self, id: &str) {
        self.session.report_mut().record_generator_usage(id);
    }

    pub(crate) fn record_fallback(&mut self, field: Option<&str>, message: String) {
        self.session.report_mut().record_fallback();
        self.session.warn_once(
            GenerationIssue::warning("generator_fallback", message)
                .at(self.table, field.unwrap_or("")),
        );
    }
}

/// Recursive dispatcher over schema nodes.
#[derive(Debug, Clone)]
pub struct Sampler {
    faker: FakeRsAdapter,
    base_date: NaiveDate,
    strict_patterns: bool,
}

impl Sampler {
    pub fn new(faker: FakeRsAdapter, base_date: NaiveDate, strict_patterns: bool) -> Self {
        Self {
            faker,
            base_date,
            strict_patterns,
        }
    }

    pub fn faker(&self) -> &FakeRsAdapter {
        &self.faker
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base_date
    }

    pub fn strict_patterns(&self) -> bool {
        self.strict_patterns
    }

    /// Parse `node` and sample it. Fails when the node is not an object, has
    /// neither `type` nor `enum`, or declares an unsupported type.
    pub fn sample_value(
        &self,
        node: &Value,
        field: Option<&str>,
        ctx: &mut SampleContext<'_>,
    ) -> Result<Value, GenerationError> {
        let node = SchemaNode::from_value(node)?;
        self.sample(&node, field, ctx)
    }

    /// Produce one value for `node`.
    pub fn sample(
        &self,
        node: &SchemaNode,
        field: Option<&str>,
        ctx: &mut SampleContext<'_>,
    ) -> Result<Value, GenerationError> {
        if let Some(default) = &node.default
            && let Some(value) = primitives::coerce_default(node, default)
        {
            ctx.record_usage("default");
            return Ok(value);
        }

        if let Some(values) = &node.enum_values {
            ctx.record_usage("enum");
            return primitives::pick_enum(values, ctx.rng);
        }

        if node.primary_key {
            return Ok(keys::primary_key(node, field, ctx));
        }

        match &node.kind {
            NodeKind::String(spec) => semantic::generate_string(self, spec, node.unique, field, ctx),
            NodeKind::Integer(spec) => {
                ctx.record_usage("integer");
                primitives::integer(spec, ctx.rng)
            }
            NodeKind::Number(spec) => {
                ctx.record_usage("number");
                primitives::number(spec, ctx.rng)
            }
            NodeKind::Boolean => {
                ctx.record_usage("boolean");
                Ok(Value::Bool(ctx.rng.random_bool(0.5)))
            }
            NodeKind::Array(spec) => self.array(spec, field, ctx),
            NodeKind::Object(spec) => self.object(spec, field, ctx),
            NodeKind::Ref(spec) => {
                ctx.record_usage("ref");
                ctx.session.resolve_reference(spec, ctx.rng)
            }
            NodeKind::Literal => Err(SchemaError::InvalidSchema(
                "schema node must have a 'type' property".to_string(),
            )
            .into()),
        }
    }

    fn array(
        &self,
        spec: &ArraySpec,
        field: Option<&str>,
        ctx: &mut SampleContext<'_>,
    ) -> Result<Value, GenerationError> {
        let items = spec.items.as_deref().ok_or_else(|| {
            SchemaError::InvalidSchema("array schema must have 'items'".to_string())
        })?;
        ctx.record_usage("array");

        let (min, max) = item_bounds(spec);
        let len = ctx.rng.random_range(min..=max);

        let item_field = match field {
            Some(field) => format!("{field}_item"),
            None => "item".to_string(),
        };
        let mut values = Vec::with_capacity(len);
        for _ in 0..len {
            values.push(self.sample(items, Some(&item_field), ctx)?);
        }
        Ok(Value::Array(values))
    }

    fn object(
        &self,
        spec: &ObjectSpec,
        field: Option<&str>,
        ctx: &mut SampleContext<'_>,
    ) -> Result<Value, GenerationError> {
        ctx.record_usage("object");
        if spec.properties.is_empty() {
            ctx.session.warn_once(
                GenerationIssue::warning("empty_object", "object schema has no properties")
                    .at(ctx.table, field.unwrap_or("")),
            );
            return Ok(Value::Object(Map::new()));
        }

        let mut record = Map::with_capacity(spec.properties.len());
        for (name, property) in &spec.properties {
            let value = self.sample(property, Some(name), ctx)?;
            record.insert(name.clone(), value);
        }
        Ok(Value::Object(record))
    }
}

/// `(minItems, maxItems)` with defaults 1/3. A lone `minItems` above the
/// default keeps the default width.
fn item_bounds(spec: &ArraySpec) -> (usize, usize) {
    match (spec.min_items, spec.max_items) {
        (Some(min), Some(max)) => (min, max.max(min)),
        (Some(min), None) if min > DEFAULT_MAX_ITEMS => {
            (min, min + (DEFAULT_MAX_ITEMS - DEFAULT_MIN_ITEMS))
        }
        (Some(min), None) => (min, DEFAULT_MAX_ITEMS),
        (None, Some(max)) => (DEFAULT_MIN_ITEMS.min(max), max),
        (None, None) => (DEFAULT_MIN_ITEMS, DEFAULT_MAX_ITEMS),
    }
}
