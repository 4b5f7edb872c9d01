//! Export subcommand for config-stack
//!
//! Merges every source and prints the resulting tree.

use super::SourceArgs;
use crate::format::OutputFormat;
use anyhow::{Result, anyhow};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export subcommand
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output format: yaml or json
    #[arg(short, long, default_value = "yaml")]
    pub format: String,

    /// Output file path (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format)
            .ok_or_else(|| anyhow!("Unknown output format '{}': use yaml or json", self.format))
    }
}
