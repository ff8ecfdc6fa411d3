use datagen_core::{Error as SchemaError, NodeKind, NumericSpec, SchemaNode};
use rand::{Rng, RngCore};
use serde_json::{Number, Value};

use crate::errors::GenerationError;

const DEFAULT_MIN: f64 = 1.0;
const DEFAULT_MAX: f64 = 1000.0;
const TRUTHY: [&str; 3] = ["true", "1", "yes"];

/// Coerce a node's `default` to its declared type.
///
/// `None` means the default could not be read as a number and generation
/// continues with `enum` or the node type.
pub fn coerce_default(node: &SchemaNode, default: &Value) -> Option<Value> {
    match node.kind {
        NodeKind::Boolean => {
            let text = match default {
                Value::String(text) => text.to_lowercase(),
                other => other.to_string().to_lowercase(),
            };
            Some(Value::Bool(TRUTHY.contains(&text.as_str())))
        }
        NodeKind::Integer(_) => as_integer(default).map(Value::from),
        NodeKind::Number(_) => as_float(default).and_then(Number::from_f64).map(Value::Number),
        _ => Some(default.clone()),
    }
}

/// Uniform pick among enum candidates.
pub fn pick_enum(values: &[Value], rng: &mut dyn RngCore) -> Result<Value, GenerationError> {
    if values.is_empty() {
        return Err(SchemaError::InvalidSchema("enum must not be empty".to_string()).into());
    }
    Ok(values[rng.random_range(0..values.len())].clone())
}

/// Whole number drawn uniformly in `[minimum, maximum]` (defaults 1/1000).
pub fn integer(spec: &NumericSpec, rng: &mut dyn RngCore) -> Result<Value, GenerationError> {
    let (min, max) = bounds(spec);
    let low = min.ceil();
    let high = max.floor();
    if low > high {
        return Err(SchemaError::InvalidSchema(format!(
            "no integer between minimum ({min}) and maximum ({max})"
        ))
        .into());
    }
    Ok(Value::from(rng.random_range(low as i64..=high as i64)))
}

/// Number drawn uniformly in `[minimum, maximum]`, rounded to 2 decimals.
pub fn number(spec: &NumericSpec, rng: &mut dyn RngCore) -> Result<Value, GenerationError> {
    let (min, max) = bounds(spec);
    let span = max - min;
    if !span.is_finite() {
        return Err(SchemaError::InvalidSchema(format!(
            "range between minimum ({min}) and maximum ({max}) is too wide"
        ))
        .into());
    }
    let raw = if span > 0.0 {
        (min + rng.random::<f64>() * span).min(max)
    } else {
        min
    };
    let rounded = (raw * 100.0).round() / 100.0;
    let value = if rounded.is_finite() {
        rounded.clamp(min, max)
    } else {
        raw
    };
    Number::from_f64(value).map(Value::Number).ok_or_else(|| {
        SchemaError::InvalidSchema(format!("cannot represent {value} as a JSON number")).into()
    })
}

/// `(minimum, maximum)` with defaults 1/1000. A lone bound outside the
/// default range keeps the default width on the other side.
fn bounds(spec: &NumericSpec) -> (f64, f64) {
    let span = DEFAULT_MAX - DEFAULT_MIN;
    match (spec.minimum, spec.maximum) {
        (Some(min), Some(max)) => (min, max),
        (Some(min), None) if min > DEFAULT_MAX => (min, min + span),
        (Some(min), None) => (min, DEFAULT_MAX),
        (None, Some(max)) if max < DEFAULT_MIN => (max - span, max),
        (None, Some(max)) => (DEFAULT_MIN, max),
        (None, None) => (DEFAULT_MIN, DEFAULT_MAX),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(|v| v.trunc() as i64)
            })
        }
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
    .filter(|v| v.is_finite())
}
