//! Configuration sources and tier discovery.
//!
//! A source reads one file into a tree. Missing files are not an error: a
//! loader pointed at a path that does not exist exports an empty mapping, so
//! callers may load every candidate location unconditionally.

use super::tree::{Tree, empty_tree};
use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A source of configuration that can be registered with a processor.
pub trait ConfigSource {
    /// Read and parse the configuration at `location`.
    ///
    /// Records `location` as the source name. A missing location leaves the
    /// source empty; unparseable content is an error.
    fn load(&mut self, location: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// The parsed tree, or an empty mapping when nothing was loaded.
    fn export(&self) -> Tree;

    /// Identifier used when registering this source's tree.
    fn source_name(&self) -> &str;
}

/// Loads YAML documents.
#[derive(Debug, Clone, Default)]
pub struct YamlConfigLoader {
    source_name: String,
    config: Option<Tree>,
}

impl YamlConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigSource for YamlConfigLoader {
    fn load(&mut self, location: &Path) -> Result<&mut Self> {
        self.source_name = location.display().to_string();
        self.config = match read_source(location)? {
            Some(content) => Some(parse_yaml(&content, location)?),
            None => None,
        };
        Ok(self)
    }

    fn export(&self) -> Tree {
        self.config.clone().unwrap_or_else(empty_tree)
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Loads JSON documents.
#[derive(Debug, Clone, Default)]
pub struct JsonConfigLoader {
    source_name: String,
    config: Option<Tree>,
}

impl JsonConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigSource for JsonConfigLoader {
    fn load(&mut self, location: &Path) -> Result<&mut Self> {
        self.source_name = location.display().to_string();
        self.config = match read_source(location)? {
            Some(content) => Some(parse_json(&content, location)?),
            None => None,
        };
        Ok(self)
    }

    fn export(&self) -> Tree {
        self.config.clone().unwrap_or_else(empty_tree)
    }

    fn source_name(&self) -> &str {
        &self.source_name
    }
}

/// Load a file with the loader matching its extension.
///
/// `.json` files are read as JSON; everything else is read as YAML.
pub fn load_file(path: &Path) -> Result<Box<dyn ConfigSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if ext == "json" {
        let mut loader = JsonConfigLoader::new();
        loader.load(path)?;
        Ok(Box::new(loader))
    } else {
        let mut loader = YamlConfigLoader::new();
        loader.load(path)?;
        Ok(Box::new(loader))
    }
}

/// Read a source file, returning `None` if it does not exist.
///
/// Any other read failure is an error.
fn read_source(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config source not found, skipping");
            Ok(None)
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn parse_yaml(content: &str, path: &Path) -> Result<Tree> {
    let blank = content.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(empty_tree());
    }
    let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    check_document(value, path)
}

fn parse_json(content: &str, path: &Path) -> Result<Tree> {
    if content.trim().is_empty() {
        return Ok(empty_tree());
    }
    let value: Value = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    check_document(value, path)
}

/// A document must be a mapping or sequence; `null` counts as empty.
fn check_document(value: Value, path: &Path) -> Result<Tree> {
    match value {
        Value::Null => Ok(empty_tree()),
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: "expected a mapping or sequence at the top level".to_string(),
        }),
    }
}

/// Candidate config locations for each tier.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project-level config directory
    pub project_dir: Option<PathBuf>,
    /// User-level config directory
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// File name looked up in each tier directory.
    pub const FILE_NAME: &'static str = "config.yaml";

    /// Discover configuration directories from environment and defaults.
    pub fn discover() -> Self {
        // Project dir: CONFIG_STACK_PROJECT_DIR or $CWD/config-stack
        let project_dir = std::env::var("CONFIG_STACK_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("config-stack")));

        // User dir: CONFIG_STACK_USER_DIR or ~/.config-stack
        let user_dir = std::env::var("CONFIG_STACK_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config-stack")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    /// Candidate files, lowest priority first. They need not exist.
    pub fn candidates(&self) -> Vec<PathBuf> {
        [&self.project_dir, &self.user_dir]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(Self::FILE_NAME))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yml");

        let mut loader = YamlConfigLoader::new();
        loader.load(&path).unwrap();

        assert_eq!(loader.export(), json!({}));
        assert_eq!(loader.source_name(), path.display().to_string());
    }

    #[test]
    fn test_unreadable_source_is_io_error() {
        let temp = TempDir::new().unwrap();
        // A path below a regular file cannot be read, but it is not "missing".
        let parent = temp.path().join("plain.yml");
        std::fs::write(&parent, "a: 1\n").unwrap();
        let path = parent.join("nested.yml");

        let err = YamlConfigLoader::new().load(&path).unwrap_err();
        match err {
            ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected io error, got {other}"),
        }
    }

    #[test]
    fn test_directory_source_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = JsonConfigLoader::new().load(temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_unloaded_source_is_empty() {
        let loader = YamlConfigLoader::new();
        assert_eq!(loader.export(), json!({}));
        assert_eq!(loader.source_name(), "");
    }

    #[test]
    fn test_load_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yml");
        std::fs::write(&path, "server:\n  port: 8080\n  hosts: [a, b]\n").unwrap();

        let mut loader = YamlConfigLoader::new();
        let tree = loader.load(&path).unwrap().export();

        assert_eq!(tree, json!({"server": {"port": 8080, "hosts": ["a", "b"]}}));
    }

    #[test]
    fn test_invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yml");
        std::fs::write(&path, "server: [unclosed\n").unwrap();

        let err = YamlConfigLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_yaml_is_empty_tree() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yml");
        std::fs::write(&path, "# only a comment\n").unwrap();

        let mut loader = YamlConfigLoader::new();
        assert_eq!(loader.load(&path).unwrap().export(), json!({}));
    }

    #[test]
    fn test_scalar_document_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scalar.yml");
        std::fs::write(&path, "just text\n").unwrap();

        let err = YamlConfigLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"a": {"b": [1, 2]}}"#).unwrap();

        let mut loader = JsonConfigLoader::new();
        assert_eq!(loader.load(&path).unwrap().export(), json!({"a": {"b": [1, 2]}}));
    }

    #[test]
    fn test_load_file_dispatches_on_extension() {
        let temp = TempDir::new().unwrap();
        let json_path = temp.path().join("a.json");
        let yaml_path = temp.path().join("b.yaml");
        std::fs::write(&json_path, r#"{"from": "json"}"#).unwrap();
        std::fs::write(&yaml_path, "from: yaml\n").unwrap();

        assert_eq!(load_file(&json_path).unwrap().export(), json!({"from": "json"}));
        assert_eq!(load_file(&yaml_path).unwrap().export(), json!({"from": "yaml"}));
    }

    #[test]
    fn test_candidates_in_tier_order() {
        let paths = ConfigPaths::with_dirs(Some(PathBuf::from("proj")), Some(PathBuf::from("user")));
        assert_eq!(
            paths.candidates(),
            vec![
                PathBuf::from("proj").join("config.yaml"),
                PathBuf::from("user").join("config.yaml"),
            ]
        );
    }

    #[test]
    fn test_candidates_skip_unset_tiers() {
        let paths = ConfigPaths::with_dirs(None, Some(PathBuf::from("user")));
        assert_eq!(paths.candidates(), vec![PathBuf::from("user").join("config.yaml")]);
    }
}
