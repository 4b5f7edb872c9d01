//! Get subcommand for config-stack
//!
//! Merges every source and prints the value at one dotted path.

use super::SourceArgs;
use crate::format::OutputFormat;
use anyhow::{Result, anyhow};
use clap::Args;

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted path of the value, e.g. `server.hosts.0`
    pub path: String,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Output format for mappings and sequences: yaml or json
    #[arg(short, long, default_value = "yaml")]
    pub format: String,
}

impl GetArgs {
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format)
            .ok_or_else(|| anyhow!("Unknown output format '{}': use yaml or json", self.format))
    }
}
