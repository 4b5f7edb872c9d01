//! Per-fragment rewriting applied before expansion.

use super::merge::merge_owned;
use super::tree::{Tree, empty_tree};
use serde_json::{Map, Value};

/// Rewrites a single fragment before it is expanded and merged.
///
/// A preprocessor only sees the fragment it is given.
pub trait Preprocessor: Send + Sync {
    fn preprocess(&self, fragment: Tree) -> Tree;
}

/// Leaves fragments as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Preprocessor for Identity {
    fn preprocess(&self, fragment: Tree) -> Tree {
        fragment
    }
}

/// Expands dotted keys into nested mappings.
///
/// `{"server.port": 80}` becomes `{"server": {"port": 80}}`. Keys that share a
/// prefix are deep merged in the order they appear.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotNotation;

impl Preprocessor for DotNotation {
    fn preprocess(&self, fragment: Tree) -> Tree {
        expand_dotted(fragment)
    }
}

fn expand_dotted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut nested = empty_tree();
            for (key, item) in map {
                let item = expand_dotted(item);
                let wrapped = key
                    .split('.')
                    .rev()
                    .fold(item, |inner, segment| {
                        let mut level = Map::new();
                        level.insert(segment.to_string(), inner);
                        Value::Object(level)
                    });
                nested = merge_owned(nested, &wrapped);
            }
            nested
        }
        Value::Array(items) => Value::Array(items.into_iter().map(expand_dotted).collect()),
        scalar => scalar,
    }
}
