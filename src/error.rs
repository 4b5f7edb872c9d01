//! Error types for configuration loading and processing.

use std::path::PathBuf;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading sources or exporting the merged tree.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The source exists but could not be read.
    #[error("Failed to read config source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source was read but its contents are not valid.
    #[error("Failed to parse config source {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A fragment referenced a property that could not be expanded.
    #[error("Failed to expand config from {source_name}: {source}")]
    Expansion {
        source_name: String,
        #[source]
        source: ExpansionError,
    },

    /// The merged tree does not fit the requested type.
    #[error("Merged config does not match the requested shape: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl ConfigError {
    /// Build an expansion error, naming anonymous fragments explicitly.
    pub fn expansion(source_name: Option<&str>, source: ExpansionError) -> Self {
        let source_name = match source_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "<anonymous>".to_string(),
        };
        Self::Expansion {
            source_name,
            source,
        }
    }
}

/// Errors raised by an expansion collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpansionError {
    /// No value exists for the referenced property.
    #[error("Unresolved property reference: ${{{0}}}")]
    Unresolved(String),

    /// The property refers back to itself through one or more references.
    #[error("Circular property reference: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// A mapping or sequence was interpolated into the middle of a string.
    #[error("Property ${{{0}}} is not a scalar and cannot be embedded in a string")]
    NotScalar(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_expansion_error_names_source() {
        let err = ConfigError::expansion(None, ExpansionError::Unresolved("a.b".into()));
        assert_eq!(
            err.to_string(),
            "Failed to expand config from <anonymous>: Unresolved property reference: ${a.b}"
        );
    }

    #[test]
    fn test_named_expansion_error_names_source() {
        let err = ConfigError::expansion(
            Some("site.yml"),
            ExpansionError::Cycle(vec!["a".into(), "b".into(), "a".into()]),
        );
        assert_eq!(
            err.to_string(),
            "Failed to expand config from site.yml: Circular property reference: a -> b -> a"
        );
    }
}
