use datagen_core::RawSchemaNode;
use schemars::schema_for;

#[test]
fn json_schema_exposes_wire_names() {
    let generated = schema_for!(RawSchemaNode);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");
    let properties = json["properties"]
        .as_object()
        .expect("schema has properties");

    for key in [
        "type",
        "enum",
        "default",
        "minLength",
        "maxLength",
        "pattern",
        "format",
        "minimum",
        "maximum",
        "minItems",
        "maxItems",
        "items",
        "properties",
        "ref",
        "primary_key",
        "unique",
    ] {
        assert!(properties.contains_key(key), "missing property {key}");
    }
    assert!(!properties.contains_key("node_type"));
    assert!(!properties.contains_key("min_length"));
}
