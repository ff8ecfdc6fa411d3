use chrono::NaiveDate;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{Value, json};

use datagen_generate::faker_rs::FakeRsAdapter;
use datagen_generate::{GenerationReport, GenerationSession, SampleContext, Sampler};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("date")
}

fn new_session() -> GenerationSession {
    GenerationSession::new(GenerationReport::new("test".to_string(), 1, base_date()))
}

fn draw(node: &Value, field: Option<&str>, times: usize) -> Vec<Value> {
    let sampler = Sampler::new(FakeRsAdapter::default(), base_date(), false);
    let mut session = new_session();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut ctx = SampleContext::new("T", &mut session, &mut rng);
    (0..times)
        .map(|_| sampler.sample_value(node, field, &mut ctx).expect("sample"))
        .collect()
}

#[test]
fn integers_respect_bounds() {
    for value in draw(&json!({"type": "integer", "minimum": -3, "maximum": 4}), None, 500) {
        let value = value.as_i64().expect("integer");
        assert!((-3..=4).contains(&value));
    }
}

#[test]
fn numbers_respect_bounds_and_precision() {
    for value in draw(&json!({"type": "number", "minimum": 0.5, "maximum": 2.5}), None, 500) {
        let value = value.as_f64().expect("number");
        assert!((0.5..=2.5).contains(&value));
        assert!(((value * 100.0).round() - value * 100.0).abs() < 1e-6);
    }
}

#[test]
fn strings_respect_length_bounds() {
    let node = json!({"type": "string", "minLength": 5, "maxLength": 8});
    for value in draw(&node, Some("label"), 300) {
        let len = value.as_str().expect("string").chars().count();
        assert!((5..=8).contains(&len), "length {len}");
    }
}

#[test]
fn arrays_respect_item_bounds() {
    let node = json!({"type": "array", "minItems": 2, "maxItems": 4, "items": {"type": "boolean"}});
    for value in draw(&node, Some("flags"), 200) {
        let items = value.as_array().expect("array");
        assert!((2..=4).contains(&items.len()));
        assert!(items.iter().all(Value::is_boolean));
    }
}

#[test]
fn enum_draws_stay_within_choices() {
    let node = json!({"type": "string", "enum": ["a", "b", "c"]});
    let values = draw(&node, None, 100);
    for value in &values {
        assert!(["a", "b", "c"].contains(&value.as_str().expect("string")));
    }
    assert!(values.iter().any(|value| value != &values[0]));
}

#[test]
fn defaults_win_over_everything() {
    let node = json!({"type": "integer", "default": "12", "enum": [1, 2], "primary_key": true});
    for value in draw(&node, Some("id"), 10) {
        assert_eq!(value, json!(12));
    }
}

#[test]
fn date_named_fields_get_dates_in_window() {
    let earliest = base_date() - chrono::Duration::days(5 * 365);
    let latest = base_date() + chrono::Duration::days(5 * 365);
    for value in draw(&json!({"type": "string"}), Some("birth_date"), 100) {
        let date = NaiveDate::parse_from_str(value.as_str().expect("string"), "%Y-%m-%d")
            .expect("iso date");
        assert!(date >= earliest && date <= latest);
    }
}

#[test]
fn node_without_type_fails() {
    let sampler = Sampler::new(FakeRsAdapter::default(), base_date(), false);
    let mut session = new_session();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut ctx = SampleContext::new("T", &mut session, &mut rng);

    assert!(sampler.sample_value(&json!({"minimum": 1}), None, &mut ctx).is_err());
    assert!(sampler.sample_value(&json!({"type": "blob"}), None, &mut ctx).is_err());
    assert!(sampler.sample_value(&json!("string"), None, &mut ctx).is_err());
}

#[test]
fn strict_patterns_reject_unknown_syntax() {
    let sampler = Sampler::new(FakeRsAdapter::default(), base_date(), true);
    let mut session = new_session();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut ctx = SampleContext::new("T", &mut session, &mut rng);

    let node = json!({"type": "string", "pattern": "^[a-f]+$"});
    assert!(sampler.sample_value(&node, Some("code"), &mut ctx).is_err());
}
