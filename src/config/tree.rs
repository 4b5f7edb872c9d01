//! Helpers for reading configuration trees.
//!
//! A tree is a `serde_json::Value`: mappings are `Value::Object`, sequences are
//! `Value::Array`, everything else is a scalar leaf.

use serde_json::{Map, Value};

/// A nested configuration structure.
pub type Tree = Value;

/// Create an empty mapping, the starting point of every accumulator.
pub fn empty_tree() -> Tree {
    Value::Object(Map::new())
}

/// Look up a dotted path such as `server.hosts.0.name`.
///
/// Numeric segments index into sequences; on mappings every segment is a
/// plain key, so `"0"` also matches a mapping key named `0`.
pub fn get_path<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(tree);
    }
    path.split('.').try_fold(tree, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Render a scalar as it appears when interpolated into text.
///
/// Returns `None` for mappings and sequences.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Object(_) | Value::Array(_) => None,
    }
}
