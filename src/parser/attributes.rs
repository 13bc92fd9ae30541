//! OTLP attribute flattening.
//!
//! OTLP/JSON encodes attributes as `[{ "key": k, "value": { "<type>Value": v } }]`.
//! This module turns such a list into a flat `key -> value` map and builds
//! nested maps out of dotted, per-index key families.

use crate::model::AttributeMap;
use log::debug;
use serde_json::{Number, Value};

/// Flatten an OTLP attribute list into a fresh map
///
/// **Public** - used by the span parser for span, resource and event attributes
///
/// A missing or empty value slot yields `null` for that key. Entries without
/// a string key are dropped. Anything that is not a list yields an empty map.
pub fn flatten_attributes(attributes: Option<&Value>) -> AttributeMap {
    let mut flat = AttributeMap::new();

    let Some(entries) = attributes.and_then(Value::as_array) else {
        return flat;
    };

    for entry in entries {
        let Some(key) = entry.get("key").and_then(Value::as_str) else {
            debug!("Dropping attribute entry without a key: {}", entry);
            continue;
        };
        let value = entry.get("value").map(any_value).unwrap_or(Value::Null);
        flat.insert(key.to_string(), value);
    }

    flat
}

/// Convert one type-tagged OTLP `AnyValue` into plain JSON
///
/// **Public** - also handles nested array and key/value list values
pub fn any_value(value: &Value) -> Value {
    let Some(slots) = value.as_object() else {
        return Value::Null;
    };

    if let Some(s) = slots.get("stringValue") {
        return s.clone();
    }
    if let Some(i) = slots.get("intValue") {
        return int_value(i);
    }
    if let Some(d) = slots.get("doubleValue") {
        return d.clone();
    }
    if let Some(b) = slots.get("boolValue") {
        return b.clone();
    }
    if let Some(array) = slots.get("arrayValue") {
        let values = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(any_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    if let Some(kvlist) = slots.get("kvlistValue") {
        return Value::Object(flatten_attributes(kvlist.get("values")));
    }
    if let Some(bytes) = slots.get("bytesValue") {
        return bytes.clone();
    }

    if !slots.is_empty() {
        debug!("Unrecognized attribute value slot: {}", value);
    }
    Value::Null
}

/// OTLP/JSON writes 64-bit integers as strings
fn int_value(raw: &Value) -> Value {
    match raw {
        Value::String(s) => s
            .parse::<i64>()
            .map(|i| Value::Number(Number::from(i)))
            .unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    }
}

/// Collect every key under `prefix` into a nested map
///
/// **Public** - used for the deprecated `gen_ai.prompt.*` family
///
/// `gen_ai.prompt.0.role = "user"` with prefix `gen_ai.prompt.` becomes
/// `{"0": {"role": "user"}}`. Returns `None` when no key matches.
pub fn nest_prefixed(attributes: &AttributeMap, prefix: &str) -> Option<AttributeMap> {
    let mut nested = AttributeMap::new();

    for (key, value) in attributes {
        let Some(path) = key.strip_prefix(prefix) else {
            continue;
        };
        if path.is_empty() {
            continue;
        }
        insert_path(&mut nested, path, value.clone());
    }

    if nested.is_empty() {
        None
    } else {
        Some(nested)
    }
}

fn insert_path(root: &mut AttributeMap, path: &str, value: Value) {
    let mut current = root;
    let mut parts = path.split('.').peekable();

    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            match current.get_mut(part) {
                Some(Value::Object(children)) => {
                    children.insert(String::new(), value);
                }
                _ => {
                    current.insert(part.to_string(), value);
                }
            }
            return;
        }

        let slot = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(AttributeMap::new()));
        if !slot.is_object() {
            // a scalar already sits on this path (`a.b` and `a.b.c` both set)
            let scalar = std::mem::replace(slot, Value::Object(AttributeMap::new()));
            if let Value::Object(map) = slot {
                map.insert(String::new(), scalar);
            }
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_scalars() {
        let attrs = json!([
            {"key": "service.name", "value": {"stringValue": "checkout"}},
            {"key": "retries", "value": {"intValue": "3"}},
            {"key": "ratio", "value": {"doubleValue": 0.5}},
            {"key": "cached", "value": {"boolValue": true}},
        ]);

        let flat = flatten_attributes(Some(&attrs));
        assert_eq!(flat["service.name"], json!("checkout"));
        assert_eq!(flat["retries"], json!(3));
        assert_eq!(flat["ratio"], json!(0.5));
        assert_eq!(flat["cached"], json!(true));
    }

    #[test]
    fn test_missing_or_empty_value_is_null() {
        let attrs = json!([
            {"key": "empty", "value": {}},
            {"key": "absent"},
        ]);

        let flat = flatten_attributes(Some(&attrs));
        assert_eq!(flat.len(), 2);
        assert_eq!(flat["empty"], Value::Null);
        assert_eq!(flat["absent"], Value::Null);
    }

    #[test]
    fn test_nested_values() {
        let attrs = json!([
            {"key": "tags", "value": {"arrayValue": {"values": [
                {"stringValue": "a"}, {"intValue": 7}
            ]}}},
            {"key": "ctx", "value": {"kvlistValue": {"values": [
                {"key": "user", "value": {"stringValue": "u1"}}
            ]}}},
        ]);

        let flat = flatten_attributes(Some(&attrs));
        assert_eq!(flat["tags"], json!(["a", 7]));
        assert_eq!(flat["ctx"], json!({"user": "u1"}));
    }

    #[test]
    fn test_not_a_list_yields_empty_map() {
        assert!(flatten_attributes(Some(&json!({"key": "x"}))).is_empty());
        assert!(flatten_attributes(None).is_empty());
    }

    #[test]
    fn test_nest_prefixed() {
        let mut attrs = AttributeMap::new();
        attrs.insert("gen_ai.prompt.0.role".into(), json!("user"));
        attrs.insert("gen_ai.prompt.0.content".into(), json!("hi"));
        attrs.insert("gen_ai.prompt.1.role".into(), json!("assistant"));
        attrs.insert("gen_ai.system".into(), json!("openai"));

        let nested = nest_prefixed(&attrs, "gen_ai.prompt.").unwrap();
        assert_eq!(
            Value::Object(nested),
            json!({"0": {"role": "user", "content": "hi"}, "1": {"role": "assistant"}})
        );
        assert!(nest_prefixed(&attrs, "gen_ai.completion.").is_none());
    }

    #[test]
    fn test_nest_prefixed_scalar_and_child_collide() {
        let mut attrs = AttributeMap::new();
        attrs.insert("gen_ai.prompt.0".into(), json!("raw"));
        attrs.insert("gen_ai.prompt.0.role".into(), json!("user"));

        let nested = nest_prefixed(&attrs, "gen_ai.prompt.").unwrap();
        assert_eq!(Value::Object(nested), json!({"0": {"": "raw", "role": "user"}}));
    }
}
