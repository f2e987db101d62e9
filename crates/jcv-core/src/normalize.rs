//! Key-order and key-filter normalization.
//!
//! These are pure tree transforms over already-parsed values. Malformed
//! input is rejected upstream at parse time, so nothing here can fail.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// Returns the value with every object's keys in ascending lexical order,
/// applied recursively through arrays and nested objects.
///
/// Idempotent and content-preserving; primitives pass through unchanged.
///
/// ```
/// # use serde_json::json;
/// use jcv_core::normalize::sort_keys;
///
/// let sorted = sort_keys(json!({"b": 1, "a": {"d": 2, "c": 3}}));
/// assert_eq!(serde_json::to_string(&sorted).unwrap(), r#"{"a":{"c":3,"d":2},"b":1}"#);
/// ```
#[must_use]
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let mut sorted = Map::with_capacity(entries.len());
            for (key, value) in entries {
                sorted.insert(key, sort_keys(value));
            }
            Value::Object(sorted)
        }
        other => other,
    }
}

/// Returns the value with every occurrence of any listed key removed, at
/// every nesting depth. Keys match by exact name regardless of position;
/// arrays are mapped element-wise and primitives pass through unchanged.
///
/// ```
/// # use std::collections::BTreeSet;
/// # use serde_json::json;
/// use jcv_core::normalize::remove_keys;
///
/// let keys: BTreeSet<String> = ["secret".to_string()].into();
/// let filtered = remove_keys(json!({"id": 1, "secret": "x", "nested": {"secret": "y"}}), &keys);
/// assert_eq!(filtered, json!({"id": 1, "nested": {}}));
/// ```
#[must_use]
pub fn remove_keys(value: Value, keys: &BTreeSet<String>) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| remove_keys(item, keys)).collect())
        }
        Value::Object(map) => {
            let mut filtered = Map::new();
            for (key, value) in map {
                if !keys.contains(&key) {
                    filtered.insert(key, remove_keys(value, keys));
                }
            }
            Value::Object(filtered)
        }
        other => other,
    }
}

/// Pretty-prints a value with the tool's 4-space indentation.
#[must_use]
pub fn to_pretty_string(value: &Value) -> String {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    serde::Serialize::serialize(value, &mut serializer).expect("JSON value serializes");
    String::from_utf8(buffer).expect("serializer emits UTF-8")
}

/// Parses JSON text, sorts every object's keys, and pretty-prints the
/// result. This is the "format and sort" action; callers feed it raw source
/// text so repeated formatting never compounds.
pub fn format_sorted(text: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(text)?;
    Ok(to_pretty_string(&sort_keys(value)))
}
