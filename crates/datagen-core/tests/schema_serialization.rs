use datagen_core::{NodeKind, RawSchemaNode, SchemaNode, StringFormat, parse_table_schemas};
use serde_json::json;

#[test]
fn serializes_raw_node_deterministically() {
    let raw = RawSchemaNode {
        node_type: Some("string".to_string()),
        min_length: Some(3),
        format: Some("email".to_string()),
        unique: true,
        ..RawSchemaNode::default()
    };

    let json = serde_json::to_string(&raw).expect("serialize node");
    assert_eq!(
        json,
        r#"{"type":"string","minLength":3,"format":"email","unique":true}"#
    );
}

#[test]
fn raw_node_round_trips_into_typed_node() {
    let value = json!({
        "type": "string",
        "format": "email",
        "unique": true,
        "title": "ignored"
    });
    let raw: RawSchemaNode = serde_json::from_value(value).expect("deserialize");
    let node = SchemaNode::from_raw(raw).expect("typed node");

    let NodeKind::String(spec) = &node.kind else {
        panic!("expected string node, got {:?}", node.kind);
    };
    assert_eq!(spec.format, Some(StringFormat::Email));
    assert!(node.unique);
    assert!(!node.primary_key);
}

#[test]
fn table_errors_name_the_table() {
    let err = parse_table_schemas(&json!({
        "users": {"type": "object", "properties": {"id": {"type": "uuid"}}}
    }))
    .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("users"), "{message}");
    assert!(message.contains("uuid"), "{message}");
}
