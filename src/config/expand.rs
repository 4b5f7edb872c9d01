//! Property expansion for configuration fragments.
//!
//! String leaves may reference other properties with `${dotted.path}`.
//! References are resolved against the fragment itself first and then
//! against the already-merged context, so a fragment can use any value
//! defined by a fragment registered before it.

use super::tree::{Tree, get_path, scalar_to_string};
use crate::error::ExpansionError;
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^{}]+)\}").expect("placeholder pattern is valid"));

/// Resolves property references in a fragment against a context tree.
pub trait Expander: Send + Sync {
    /// Return `fragment` with its property references resolved.
    fn expand(&self, fragment: &Tree, context: &Tree) -> Result<Tree, ExpansionError>;
}

/// How a reference with no matching value is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unresolved {
    /// Fail the expansion.
    #[default]
    Error,
    /// Leave the placeholder text in place.
    Keep,
}

/// Expands `${dotted.path}` placeholders.
///
/// - A string consisting of a single placeholder takes the referenced value
///   with its type, so `${server.port}` can yield a number or a mapping.
/// - Placeholders embedded in longer strings are replaced by the scalar's
///   text; embedding a mapping or sequence fails.
/// - `${env.NAME}` falls back to the process environment.
/// - Values referenced inside the same fragment are expanded recursively,
///   and a reference chain that loops back on itself fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyExpander {
    unresolved: Unresolved,
}

impl PropertyExpander {
    /// Create an expander that fails on unresolved references.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expander that leaves unresolved references untouched.
    pub fn lenient() -> Self {
        Self {
            unresolved: Unresolved::Keep,
        }
    }

    /// Set the policy for unresolved references.
    pub fn with_unresolved(mut self, unresolved: Unresolved) -> Self {
        self.unresolved = unresolved;
        self
    }
}

impl Expander for PropertyExpander {
    fn expand(&self, fragment: &Tree, context: &Tree) -> Result<Tree, ExpansionError> {
        let mut resolver = Resolver {
            fragment,
            context,
            unresolved: self.unresolved,
            stack: Vec::new(),
            resolved: HashMap::new(),
        };
        resolver.expand_value(fragment)
    }
}

/// Expander that returns fragments unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

impl Expander for NoExpansion {
    fn expand(&self, fragment: &Tree, _context: &Tree) -> Result<Tree, ExpansionError> {
        Ok(fragment.clone())
    }
}

struct Resolver<'a> {
    fragment: &'a Value,
    context: &'a Value,
    unresolved: Unresolved,
    /// Paths currently being resolved, outermost first.
    stack: Vec<String>,
    /// Fragment paths already expanded, by path.
    resolved: HashMap<String, Value>,
}

impl<'a> Resolver<'a> {
    fn expand_value(&mut self, value: &Value) -> Result<Value, ExpansionError> {
        match value {
            Value::String(text) => self.expand_string(text),
            Value::Array(items) => items
                .iter()
                .map(|item| self.expand_value(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut expanded = Map::with_capacity(map.len());
                for (key, item) in map {
                    expanded.insert(key.clone(), self.expand_value(item)?);
                }
                Ok(Value::Object(expanded))
            }
            scalar => Ok(scalar.clone()),
        }
    }

    fn expand_string(&mut self, text: &str) -> Result<Value, ExpansionError> {
        if let Some(caps) = PLACEHOLDER.captures(text)
            && let Some(whole) = caps.get(0)
            && whole.start() == 0
            && whole.end() == text.len()
        {
            let path = caps[1].trim();
            return Ok(self
                .resolve(path)?
                .unwrap_or_else(|| Value::String(text.to_string())));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let path = caps[1].trim();
            out.push_str(&text[last..whole.start()]);
            match self.resolve(path)? {
                Some(value) => {
                    let rendered = scalar_to_string(&value)
                        .ok_or_else(|| ExpansionError::NotScalar(path.to_string()))?;
                    out.push_str(&rendered);
                }
                None => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(Value::String(out))
    }

    /// Find the value for `path`, or `None` when it is unresolved and kept.
    fn resolve(&mut self, path: &str) -> Result<Option<Value>, ExpansionError> {
        if self.stack.iter().any(|p| p == path) {
            let mut chain = self.stack.clone();
            chain.push(path.to_string());
            return Err(ExpansionError::Cycle(chain));
        }

        if let Some(cached) = self.resolved.get(path) {
            return Ok(Some(cached.clone()));
        }

        if let Some(found) = get_path(self.fragment, path) {
            self.stack.push(path.to_string());
            let expanded = self.expand_value(found);
            self.stack.pop();
            let expanded = expanded?;
            self.resolved.insert(path.to_string(), expanded.clone());
            return Ok(Some(expanded));
        }

        if let Some(found) = get_path(self.context, path) {
            return Ok(Some(found.clone()));
        }

        if let Some(name) = path.strip_prefix("env.")
            && let Ok(value) = std::env::var(name)
        {
            return Ok(Some(Value::String(value)));
        }

        match self.unresolved {
            Unresolved::Error => Err(ExpansionError::Unresolved(path.to_string())),
            Unresolved::Keep => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expand(fragment: Value, context: Value) -> Result<Value, ExpansionError> {
        PropertyExpander::new().expand(&fragment, &context)
    }

    #[test]
    fn test_reference_into_context() {
        let result = expand(
            json!({"url": "http://${server.host}:${server.port}/"}),
            json!({"server": {"host": "localhost", "port": 8080}}),
        )
        .unwrap();
        assert_eq!(result, json!({"url": "http://localhost:8080/"}));
    }

    #[test]
    fn test_whole_placeholder_keeps_type() {
        let result = expand(
            json!({"port": "${server.port}", "server_copy": "${server}"}),
            json!({"server": {"port": 8080}}),
        )
        .unwrap();
        assert_eq!(
            result,
            json!({"port": 8080, "server_copy": {"port": 8080}})
        );
    }

    #[test]
    fn test_reference_within_fragment() {
        let result = expand(
            json!({"name": "site", "dir": "/var/${name}", "log": "${dir}/log"}),
            json!({}),
        )
        .unwrap();
        assert_eq!(
            result,
            json!({"name": "site", "dir": "/var/site", "log": "/var/site/log"})
        );
    }

    #[test]
    fn test_fragment_value_wins_over_context() {
        let result = expand(
            json!({"env_name": "prod", "label": "${env_name}"}),
            json!({"env_name": "dev"}),
        )
        .unwrap();
        assert_eq!(result["label"], json!("prod"));
    }

    #[test]
    fn test_sequence_index_reference() {
        let result = expand(json!({"first": "${hosts.0}"}), json!({"hosts": ["a", "b"]})).unwrap();
        assert_eq!(result, json!({"first": "a"}));
    }

    #[test]
    fn test_unresolved_is_error_by_default() {
        let err = expand(json!({"a": "${missing.key}"}), json!({})).unwrap_err();
        assert_eq!(err, ExpansionError::Unresolved("missing.key".into()));
    }

    #[test]
    fn test_unresolved_kept_when_lenient() {
        let result = PropertyExpander::lenient()
            .expand(&json!({"a": "${missing}", "b": "x-${missing}-y"}), &json!({}))
            .unwrap();
        assert_eq!(result, json!({"a": "${missing}", "b": "x-${missing}-y"}));
    }

    #[test]
    fn test_cycle_detected() {
        let err = expand(json!({"a": "${b}", "b": "${a}"}), json!({})).unwrap_err();
        assert_eq!(
            err,
            ExpansionError::Cycle(vec!["b".into(), "a".into(), "b".into()])
        );
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let err = expand(json!({"path": "${path}:/usr/bin"}), json!({"path": "/bin"})).unwrap_err();
        assert!(matches!(err, ExpansionError::Cycle(_)));
    }

    #[test]
    fn test_embedding_composite_fails() {
        let err = expand(json!({"a": "value: ${server}"}), json!({"server": {"port": 1}})).unwrap_err();
        assert_eq!(err, ExpansionError::NotScalar("server".into()));
    }

    #[test]
    fn test_env_fallback() {
        let path = std::env::var("PATH").expect("PATH is set");
        let result = expand(json!({"search": "${env.PATH}:/opt/bin"}), json!({})).unwrap();
        assert_eq!(result, json!({"search": format!("{path}:/opt/bin")}));
    }

    #[test]
    fn test_repeated_references_expand_once() {
        // Each key references the next one twice; without reuse of already
        // expanded paths this chain would take 2^40 steps.
        let depth = 40;
        let mut fragment = Map::new();
        for i in 0..depth {
            fragment.insert(format!("k{i}"), json!(format!("${{k{}}}${{k{}}}", i + 1, i + 1)));
        }
        fragment.insert(format!("k{depth}"), json!(""));

        let result = expand(Value::Object(fragment), json!({})).unwrap();
        assert_eq!(result["k0"], json!(""));
        assert_eq!(result[format!("k{depth}").as_str()], json!(""));
    }

    #[test]
    fn test_shared_reference_reused_across_keys() {
        let result = expand(
            json!({"base": "/srv", "a": "${dir}/a", "b": "${dir}/b", "dir": "${base}/app"}),
            json!({}),
        )
        .unwrap();
        assert_eq!(result["a"], json!("/srv/app/a"));
        assert_eq!(result["b"], json!("/srv/app/b"));
        assert_eq!(result["dir"], json!("/srv/app"));
    }

    #[test]
    fn test_no_expansion_passthrough() {
        let fragment = json!({"a": "${b}"});
        assert_eq!(NoExpansion.expand(&fragment, &json!({})).unwrap(), fragment);
    }
}
