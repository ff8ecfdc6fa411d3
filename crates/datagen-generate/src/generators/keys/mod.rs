//! Primary-key identifiers.
//!
//! Integer keys count up per table. String keys are `{prefix}-{number}` where
//! the number is random with 3 to 10 digits, offset by a per-prefix counter.
//! String keys are unlikely to collide, but uniqueness is not guaranteed.

use datagen_core::{NodeKind, SchemaNode};
use rand::Rng;
use serde_json::Value;

use crate::generators::SampleContext;

const PREFIX_LEN: usize = 3;
const FALLBACK_PREFIX: &str = "gen";

pub fn primary_key(node: &SchemaNode, field: Option<&str>, ctx: &mut SampleContext<'_>) -> Value {
    match node.kind {
        NodeKind::Integer(_) => {
            ctx.record_usage("key.integer");
            Value::from(ctx.session.next_integer_key(ctx.table))
        }
        _ => {
            ctx.record_usage("key.string");
            Value::String(string_key(field, ctx))
        }
    }
}

fn string_key(field: Option<&str>, ctx: &mut SampleContext<'_>) -> String {
    let prefix = key_prefix(ctx.table, field);
    let counter = ctx.session.next_pk_counter(&prefix);

    let digits: u32 = ctx.rng.random_range(3..=10);
    let min = 10_u64.pow(digits - 1);
    let max = 10_u64.pow(digits) - 1;
    let upper = max.saturating_sub(counter).max(min);
    let number = ctx.rng.random_range(min..=upper) + counter;

    format!("{prefix}-{number}")
}

/// First three characters of the field name, else of the table name, else
/// `gen`; lowercased and padded with `x`.
pub fn key_prefix(table: &str, field: Option<&str>) -> String {
    let source = field
        .filter(|field| !field.is_empty())
        .or_else(|| Some(table).filter(|table| !table.is_empty()))
        .unwrap_or(FALLBACK_PREFIX);

    let mut prefix: String = source.to_lowercase().chars().take(PREFIX_LEN).collect();
    while prefix.chars().count() < PREFIX_LEN {
        prefix.push('x');
    }
    prefix
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GenerationReport;
    use crate::session::GenerationSession;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    #[test]
    fn prefixes_follow_field_then_table() {
        assert_eq!(key_prefix("Users", Some("OrderId")), "ord");
        assert_eq!(key_prefix("Users", Some("")), "use");
        assert_eq!(key_prefix("T", None), "txx");
        assert_eq!(key_prefix("", None), "gen");
    }

    #[test]
    fn prefix_stays_three_chars_when_lowercasing_expands() {
        let prefix = key_prefix("t", Some("İİİİ"));
        assert_eq!(prefix.chars().count(), 3);
        assert_eq!(prefix, "i\u{307}i");
    }

    #[test]
    fn keys_have_prefix_and_digits() {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let mut session =
            GenerationSession::new(GenerationReport::new("test".to_string(), 1, base_date));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ctx = SampleContext::new("accounts", &mut session, &mut rng);
        let node = SchemaNode::from_value(&json!({"type": "string", "primary_key": true}))
            .expect("node");

        for _ in 0..200 {
            let key = primary_key(&node, Some("id"), &mut ctx);
            let key = key.as_str().expect("string key");
            let (prefix, number) = key.split_once('-').expect("dash");
            assert_eq!(prefix, "idx");
            assert!((3..=11).contains(&number.len()));
            assert!(number.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn integer_keys_count_per_table() {
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let mut session =
            GenerationSession::new(GenerationReport::new("test".to_string(), 1, base_date));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let node = SchemaNode::from_value(&json!({"type": "integer", "primary_key": true}))
            .expect("node");

        let mut ctx = SampleContext::new("users", &mut session, &mut rng);
        assert_eq!(primary_key(&node, Some("id"), &mut ctx), json!(1));
        assert_eq!(primary_key(&node, Some("id"), &mut ctx), json!(2));
        let mut ctx = SampleContext::new("orders", &mut session, &mut rng);
        assert_eq!(primary_key(&node, Some("id"), &mut ctx), json!(1));
    }
}
