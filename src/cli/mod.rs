//! CLI command definitions for config-stack
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod export;
pub mod get;

use crate::config::{
    ConfigPaths, ConfigProcessor, DotNotation, PropertyExpander, Tree, Unresolved, load_file,
    merge_all,
};
use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use export::ExportArgs;
use get::GetArgs;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::info;

/// Layered configuration assembly
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge config sources and print the result
    Export(ExportArgs),

    /// Merge config sources and print a single value
    Get(GetArgs),
}

/// Config sources shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Config files to merge, lowest priority first; missing files are skipped
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Override a value after all files, e.g. `--set server.port=9000`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Also load the project and user config directories before FILE arguments
    #[arg(long)]
    pub discover: bool,

    /// Expand dotted keys such as `server.port: 80` into nested mappings
    #[arg(long)]
    pub dot_notation: bool,

    /// Leave unresolved `${...}` references in place instead of failing
    #[arg(long)]
    pub lenient: bool,
}

impl SourceArgs {
    /// Files to load, in merge order.
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        if self.discover {
            files.extend(ConfigPaths::discover().candidates());
        }
        files.extend(self.files.iter().cloned());
        files
    }

    /// Parse `--set` arguments into one tree.
    pub fn overrides_tree(&self) -> Result<Option<Tree>> {
        if self.overrides.is_empty() {
            return Ok(None);
        }
        let trees = self
            .overrides
            .iter()
            .map(|arg| parse_override(arg))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(merge_all(&trees)))
    }

    /// Build a processor with every source registered.
    pub fn build_processor(&self) -> Result<ConfigProcessor> {
        let unresolved = if self.lenient {
            Unresolved::Keep
        } else {
            Unresolved::Error
        };
        let expander = PropertyExpander::new().with_unresolved(unresolved);
        let mut processor = ConfigProcessor::new().with_expander(expander);
        if self.dot_notation {
            processor = processor.with_preprocessor(DotNotation);
        }

        for path in self.source_files() {
            let source = load_file(&path)
                .with_context(|| format!("Failed to load config source {}", path.display()))?;
            processor.extend(source.as_ref());
        }

        if let Some(overrides) = self.overrides_tree()? {
            processor.add(overrides, "");
        }

        info!(
            sources = processor.pending_sources().len(),
            "Registered config sources"
        );
        Ok(processor)
    }
}

/// Parse `key.path=value` into a nested tree.
///
/// The value is read as a YAML scalar, so `9000` is a number and `true` a bool.
/// Anything that would parse as a mapping or sequence is kept as plain text.
fn parse_override(arg: &str) -> Result<Tree> {
    let Some((key, raw)) = arg.split_once('=') else {
        bail!("Invalid override '{}': expected KEY=VALUE", arg);
    };
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        bail!("Invalid override '{}': empty key segment", arg);
    }

    let value = if raw.is_empty() {
        Value::String(String::new())
    } else {
        match serde_yaml::from_str::<Value>(raw) {
            Ok(Value::Object(_) | Value::Array(_)) | Err(_) => Value::String(raw.to_string()),
            Ok(scalar) => scalar,
        }
    };

    Ok(key.split('.').rev().fold(value, |inner, segment| {
        let mut level = Map::new();
        level.insert(segment.to_string(), inner);
        Value::Object(level)
    }))
}
