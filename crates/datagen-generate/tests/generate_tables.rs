use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde_json::{Value, json};

use datagen_generate::{
    GenerateOptions, GenerationEngine, GenerationError, Record, SchemaMap, TableData,
};

fn engine(seed: u64) -> GenerationEngine {
    GenerationEngine::new(GenerateOptions {
        seed: Some(seed),
        base_date: NaiveDate::from_ymd_opt(2024, 3, 15),
        ..GenerateOptions::default()
    })
}

fn schemas(value: Value) -> SchemaMap {
    serde_json::from_value(value).expect("schema map")
}

fn counts(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
    entries
        .iter()
        .map(|(table, count)| (table.to_string(), *count))
        .collect()
}

fn shop() -> SchemaMap {
    schemas(json!({
        "Parent": {
            "type": "object",
            "title": "Parent table",
            "properties": {
                "id": {"type": "integer", "primary_key": true},
                "code": {"type": "string", "primary_key": true},
                "name": {"type": "string", "format": "name", "description": "display name"}
            }
        },
        "Child": {
            "type": "object",
            "properties": {
                "id": {"type": "integer", "primary_key": true},
                "parent_id": {"type": "ref", "ref": "Parent.id"},
                "parent_code": {"type": "ref", "ref": "Parent.code"},
                "qty": {"type": "integer", "minimum": 1, "maximum": 9}
            }
        }
    }))
}

#[test]
fn child_references_point_at_generated_parents() {
    let result = engine(11)
        .generate(&shop(), &counts(&[("Parent", 5), ("Child", 20)]))
        .expect("generation succeeds");

    let parents = result.rows("Parent");
    let children = result.rows("Child");
    assert_eq!(parents.len(), 5);
    assert_eq!(children.len(), 20);

    let parent_ids: HashSet<String> = parents.iter().map(|row| row["id"].to_string()).collect();
    let parent_codes: HashSet<String> =
        parents.iter().map(|row| row["code"].to_string()).collect();
    for child in children {
        assert!(parent_ids.contains(&child["parent_id"].to_string()));
        assert!(parent_codes.contains(&child["parent_code"].to_string()));
    }

    let ids: Vec<i64> = parents
        .iter()
        .map(|row| row["id"].as_i64().expect("integer key"))
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn report_describes_the_run() {
    let result = engine(3)
        .generate(&shop(), &counts(&[("Parent", 2), ("Child", 4), ("Ghost", 1)]))
        .expect("generation succeeds");

    let report = &result.report;
    assert_eq!(report.seed, 3);
    assert_eq!(report.generation_order, vec!["Parent", "Child"]);
    assert_eq!(report.skipped_tables, vec!["Ghost"]);
    assert_eq!(report.total_records(), 6);
    assert_eq!(report.tables.len(), 2);
    assert!(report.generator_usage.contains_key("ref"));
    assert_eq!(report.warnings_by_code.get("table_skipped"), Some(&1));
    assert!(!result.data.contains_key("Ghost"));
}

#[test]
fn malformed_tables_without_counts_are_skipped() {
    let schemas = schemas(json!({
        "A": {"type": "object", "properties": {"id": {"type": "integer"}}},
        "B": {"type": "object", "properties": {"x": {"minimum": 1}}}
    }));

    let result = engine(4)
        .generate(&schemas, &counts(&[("A", 3)]))
        .expect("generation succeeds");

    assert_eq!(result.rows("A").len(), 3);
    assert!(!result.data.contains_key("B"));
    assert_eq!(result.report.skipped_tables, vec!["B"]);
    assert_eq!(result.report.warnings_by_code.get("table_skipped"), Some(&1));

    let err = engine(4)
        .generate(&schemas, &counts(&[("A", 3), ("B", 1)]))
        .unwrap_err();
    assert!(matches!(err, GenerationError::TableSchema { ref table, .. } if table == "B"));
}

#[test]
fn totals_match_requested_counts() {
    let result = engine(5)
        .generate(&shop(), &counts(&[("Parent", 7), ("Child", 13)]))
        .expect("generation succeeds");
    let total: usize = result.data.values().map(Vec::len).sum();
    assert_eq!(total, 20);
}

#[test]
fn empty_inputs_fail() {
    let err = engine(1)
        .generate(&SchemaMap::new(), &BTreeMap::new())
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(_)));

    let err = engine(1).generate(&shop(), &BTreeMap::new()).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidInput(_)));
}

#[test]
fn counts_above_limit_fail() {
    let engine = GenerationEngine::new(GenerateOptions {
        seed: Some(1),
        max_records_per_table: 10,
        ..GenerateOptions::default()
    });
    let err = engine
        .generate(&shop(), &counts(&[("Parent", 11)]))
        .unwrap_err();
    assert!(matches!(err, GenerationError::CountLimit { limit: 10, .. }));
}

#[test]
fn record_failure_aborts_without_partial_results() {
    let broken = schemas(json!({
        "Orders": {"type": "object", "properties": {
            "customer": {"type": "ref", "ref": "Customers.id"}
        }}
    }));
    let err = engine(1)
        .generate(&broken, &counts(&[("Orders", 2)]))
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("record 1"), "{message}");
    assert!(message.contains("Orders"), "{message}");
}

#[test]
fn preloaded_rows_resolve_references_outside_batch() {
    let orders = schemas(json!({
        "Orders": {"type": "object", "properties": {
            "customer": {"type": "ref", "ref": "Customers.id"}
        }}
    }));
    let customers: Vec<Record> = (100..103)
        .map(|id| {
            let mut row = Record::new();
            row.insert("id".to_string(), json!(id));
            row
        })
        .collect();
    let preloaded = TableData::from([("Customers".to_string(), customers)]);

    let result = engine(9)
        .generate_with_references(&orders, &counts(&[("Orders", 10)]), preloaded)
        .expect("generation succeeds");

    assert!(!result.data.contains_key("Customers"));
    for row in result.rows("Orders") {
        let id = row["customer"].as_i64().expect("id");
        assert!((100..103).contains(&id));
    }
}

#[test]
fn cycles_generate_when_one_side_is_preloaded() {
    let cyclic = schemas(json!({
        "X": {"type": "object", "properties": {
            "id": {"type": "integer", "primary_key": true},
            "y": {"type": "ref", "ref": "Y.id"}
        }},
        "Y": {"type": "object", "properties": {
            "id": {"type": "integer", "primary_key": true},
            "x": {"type": "ref", "ref": "X.id"}
        }}
    }));
    let mut seed_row = Record::new();
    seed_row.insert("id".to_string(), json!(42));

    let result = engine(2)
        .generate_with_references(
            &cyclic,
            &counts(&[("X", 3), ("Y", 3)]),
            TableData::from([("X".to_string(), vec![seed_row])]),
        )
        .expect("generation succeeds");

    assert_eq!(result.report.generation_order, vec!["Y", "X"]);
    assert_eq!(result.report.cycles.len(), 1);
    for row in result.rows("Y") {
        assert_eq!(row["x"], json!(42));
    }
    let y_ids: HashSet<i64> = result
        .rows("Y")
        .iter()
        .map(|row| row["id"].as_i64().expect("id"))
        .collect();
    for row in result.rows("X") {
        assert!(y_ids.contains(&row["y"].as_i64().expect("ref")));
    }
}

#[test]
fn single_table_generation() {
    let schema = json!({
        "type": "object",
        "properties": {
            "sku": {"type": "string", "pattern": "[A-Z]{3}-[0-9]{4}"},
            "active": {"type": "boolean"}
        }
    });
    let result = engine(8)
        .generate_table("Data", &schema, 25)
        .expect("generation succeeds");

    let rows = result.rows("Data");
    assert_eq!(rows.len(), 25);
    for row in rows {
        let sku = row["sku"].as_str().expect("sku");
        assert_eq!(sku.len(), 8);
        assert!(row["active"].is_boolean());
    }
}

#[test]
fn concurrent_calls_do_not_share_state() {
    let engine = engine(4);
    let schemas = shop();
    let counts = counts(&[("Parent", 3), ("Child", 3)]);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let schemas = schemas.clone();
            let counts = counts.clone();
            std::thread::spawn(move || engine.generate(&schemas, &counts))
        })
        .collect();

    for handle in handles {
        let result = handle
            .join()
            .expect("thread joins")
            .expect("generation succeeds");
        let ids: Vec<i64> = result
            .rows("Parent")
            .iter()
            .map(|row| row["id"].as_i64().expect("id"))
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
