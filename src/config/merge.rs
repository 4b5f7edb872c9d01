//! Deep merge for configuration trees.
//!
//! Implements key-by-key merging where the incoming tree overrides the base.
//! Sequences are merged index by index rather than concatenated or replaced:
//! `[1, 2]` merged with `[9]` yields `[9, 2]`. Existing configuration files
//! depend on this behavior, so it must not be "fixed" to concatenation.

use serde_json::{Map, Value};

/// Deep merge two trees, with `incoming` taking precedence over `base`.
///
/// - Keys missing from `base` are copied in from `incoming`
/// - When both sides hold a mapping or sequence at a key, they are merged recursively
/// - Otherwise the incoming value replaces the base value, `null` included
/// - Sequences merge positionally; a shorter incoming sequence keeps the base tail
/// - A mapping meeting a sequence merges by key, treating indices as `"0"`, `"1"`, ...
///
/// Neither input is modified.
///
/// # Example
/// ```
/// use serde_json::json;
/// use config_stack::config::merge_distinct;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let incoming = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = merge_distinct(&base, &incoming);
/// assert_eq!(
///     result,
///     json!({
///         "server": { "port": 9000, "host": "localhost" },
///         "features": ["c", "b"]
///     })
/// );
/// ```
pub fn merge_distinct(base: &Value, incoming: &Value) -> Value {
    merge_owned(base.clone(), incoming)
}

/// Merge `incoming` into an owned `base`, reusing its allocation.
pub(crate) fn merge_owned(base: Value, incoming: &Value) -> Value {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(incoming_map)) => {
            Value::Object(merge_maps(base_map, incoming_map))
        }
        (Value::Array(mut base_items), Value::Array(incoming_items)) => {
            for (index, incoming_item) in incoming_items.iter().enumerate() {
                if index < base_items.len() {
                    let base_item = std::mem::take(&mut base_items[index]);
                    base_items[index] = merge_owned(base_item, incoming_item);
                } else {
                    base_items.push(incoming_item.clone());
                }
            }
            Value::Array(base_items)
        }
        (Value::Array(base_items), Value::Object(incoming_map)) => {
            Value::Object(merge_maps(indexed_map(base_items), incoming_map))
        }
        (Value::Object(base_map), Value::Array(incoming_items)) => {
            let incoming_map = indexed_map(incoming_items.clone());
            Value::Object(merge_maps(base_map, &incoming_map))
        }
        // Any scalar on either side: incoming replaces base entirely
        (_, incoming) => incoming.clone(),
    }
}

fn merge_maps(mut base_map: Map<String, Value>, incoming_map: &Map<String, Value>) -> Map<String, Value> {
    for (key, incoming_value) in incoming_map {
        let merged_value = match base_map.get_mut(key) {
            Some(base_value) => merge_owned(std::mem::take(base_value), incoming_value),
            None => incoming_value.clone(),
        };
        base_map.insert(key.clone(), merged_value);
    }
    base_map
}

/// View a sequence as a mapping keyed by stringified index.
fn indexed_map(items: Vec<Value>) -> Map<String, Value> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| (index.to_string(), item))
        .collect()
}

/// Merge multiple trees in order, with later trees taking precedence.
///
/// Equivalent to folding `merge_distinct` over the list, starting from an
/// empty mapping.
pub fn merge_all<'a>(values: impl IntoIterator<Item = &'a Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Map::new()), merge_owned)
}
