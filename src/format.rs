//! Output formatting for merged configuration.

use crate::config::{Tree, scalar_to_string};
use anyhow::Result;

/// Output format for exported trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    /// Render a whole tree.
    pub fn render(self, tree: &Tree) -> Result<String> {
        let mut out = match self {
            OutputFormat::Yaml => serde_yaml::to_string(tree)?,
            OutputFormat::Json => serde_json::to_string_pretty(tree)?,
        };
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Ok(out)
    }

    /// Render a single looked-up value.
    ///
    /// Scalars print as bare text so they can be used in shell scripts.
    pub fn render_value(self, value: &Tree) -> Result<String> {
        if let Some(text) = scalar_to_string(value) {
            return Ok(format!("{}\n", text));
        }
        self.render(value)
    }
}
