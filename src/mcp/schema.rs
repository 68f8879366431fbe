//! Tool schema helpers: client compatibility and sample arguments.

use serde_json::{Map, Value, json};

/// Composite keywords some MCP clients refuse at the top of an input schema.
const COMPOSITE_KEYWORDS: [&str; 3] = ["oneOf", "anyOf", "allOf"];

/// Strip top-level `oneOf`/`anyOf`/`allOf` from a tool input schema.
///
/// Only the top level is touched; nested schemas and `type`, `properties`
/// and `required` are left as they are. The removed constraints are not
/// replaced, so conditional requirements must be checked by the tool itself.
/// Non-object schemas are returned unchanged.
pub fn transform_schema(schema: Value) -> Value {
    let Value::Object(mut map) = schema else {
        return schema;
    };

    let removed: Vec<&str> = COMPOSITE_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| map.remove(*keyword).is_some())
        .collect();
    if !removed.is_empty() {
        tracing::debug!(?removed, "stripped composite keywords from tool schema");
    }

    Value::Object(map)
}

/// Build a sample argument object from the schema's `properties`.
///
/// Each property takes its declared `default`, then its first `enum` value,
/// then a placeholder chosen by `type`.
pub fn sample_arguments(schema: &Value) -> Value {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Value::Object(Map::new());
    };

    properties
        .iter()
        .map(|(name, property)| (name.clone(), sample_value(property)))
        .collect::<Map<_, _>>()
        .into()
}

fn sample_value(property: &Value) -> Value {
    if let Some(default) = property.get("default") {
        return default.clone();
    }
    if let Some(first) = property.get("enum").and_then(Value::as_array).and_then(|values| values.first()) {
        return first.clone();
    }
    match property.get("type").and_then(Value::as_str) {
        Some("string") => json!("example_string"),
        Some("number") | Some("integer") => json!(42),
        Some("boolean") => json!(true),
        Some("array") => json!([]),
        Some("object") => json!({}),
        _ => json!("example_value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditional_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "uuid": {"type": "string"},
                "path": {"type": "string", "oneOf": [{"minLength": 1}]}
            },
            "required": ["name"],
            "oneOf": [{"required": ["uuid"]}, {"required": ["path"]}],
            "anyOf": [{"required": ["uuid"]}],
            "allOf": [{"required": ["name"]}]
        })
    }

    #[test]
    fn strips_only_top_level_composites() {
        let transformed = transform_schema(conditional_schema());

        assert!(transformed.get("oneOf").is_none());
        assert!(transformed.get("anyOf").is_none());
        assert!(transformed.get("allOf").is_none());
        assert_eq!(transformed["type"], "object");
        assert_eq!(transformed["required"], json!(["name"]));
        assert!(transformed["properties"]["path"].get("oneOf").is_some());
    }

    #[test]
    fn transform_is_idempotent() {
        let once = transform_schema(conditional_schema());
        let twice = transform_schema(once.clone());
        assert_eq!(once, twice);

        let plain = json!({"type": "object", "properties": {}});
        assert_eq!(transform_schema(plain.clone()), plain);
    }

    #[test]
    fn non_object_schema_is_returned_unchanged() {
        assert_eq!(transform_schema(Value::Null), Value::Null);
        assert_eq!(transform_schema(json!("schema")), json!("schema"));
        assert_eq!(transform_schema(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn sample_arguments_prefer_defaults_then_enums_then_placeholders() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "default": "Node"},
                "layer": {"type": "string", "enum": ["UI_2D", "DEFAULT"]},
                "count": {"type": "integer"},
                "scale": {"type": "number"},
                "active": {"type": "boolean"},
                "children": {"type": "array"},
                "position": {"type": "object"},
                "anything": {}
            }
        });

        assert_eq!(
            sample_arguments(&schema),
            json!({
                "name": "Node",
                "layer": "UI_2D",
                "count": 42,
                "scale": 42,
                "active": true,
                "children": [],
                "position": {},
                "anything": "example_value"
            })
        );
    }

    #[test]
    fn sample_arguments_without_properties_is_empty() {
        assert_eq!(sample_arguments(&json!({"type": "object"})), json!({}));
        assert_eq!(sample_arguments(&Value::Null), json!({}));
    }
}
