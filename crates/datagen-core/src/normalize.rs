use serde_json::Value;

/// Keys carried by introspected schemas that have no effect on generation.
const METADATA_KEYS: [&str; 2] = ["title", "description"];

/// Strip introspection metadata from object and array nodes, recursing into
/// `properties` and `items`. Anything else is returned unchanged.
pub fn normalize(node: Value) -> Value {
    let Value::Object(mut map) = node else {
        return node;
    };

    match map.get("type").and_then(Value::as_str) {
        Some("object") => {
            strip_metadata(&mut map);
            if let Some(Value::Object(properties)) = map.get_mut("properties") {
                for property in properties.values_mut() {
                    *property = normalize(property.take());
                }
            }
        }
        Some("array") => {
            strip_metadata(&mut map);
            if let Some(items) = map.get_mut("items") {
                *items = normalize(items.take());
            }
        }
        _ => {}
    }

    Value::Object(map)
}

fn strip_metadata(map: &mut serde_json::Map<String, Value>) {
    for key in METADATA_KEYS {
        map.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_metadata_recursively() {
        let input = json!({
            "type": "object",
            "title": "User",
            "description": "introspected",
            "properties": {
                "tags": {
                    "type": "array",
                    "title": "Tags",
                    "items": {"type": "object", "description": "tag", "properties": {}}
                },
                "name": {"type": "string", "title": "kept on leaves"}
            }
        });

        let output = normalize(input);
        assert_eq!(
            output,
            json!({
                "type": "object",
                "properties": {
                    "tags": {"type": "array", "items": {"type": "object", "properties": {}}},
                    "name": {"type": "string", "title": "kept on leaves"}
                }
            })
        );
    }

    #[test]
    fn non_mapping_is_unchanged() {
        assert_eq!(normalize(json!("string")), json!("string"));
        assert_eq!(normalize(json!([1, 2])), json!([1, 2]));
    }
}
