//! config-stack
//!
//! Merges layered configuration files, with `${...}` property expansion,
//! and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use config_stack::cli::export::ExportArgs;
use config_stack::cli::get::GetArgs;
use config_stack::cli::{Cli, Command};
use config_stack::logging::{LogTarget, init_logging};
use std::io::Write;
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&LogTarget::parse(&cli.log), cli.verbose)?;

    match cli.command {
        Command::Export(args) => run_export(args),
        Command::Get(args) => run_get(args),
    }
}

fn run_export(args: ExportArgs) -> Result<()> {
    let format = args.output_format()?;
    let mut processor = args.sources.build_processor()?;
    let tree = processor.export()?;
    let rendered = format.render(tree)?;

    match args.output {
        Some(ref path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), "Wrote merged config");
        }
        None => {
            std::io::stdout().write_all(rendered.as_bytes())?;
        }
    }
    Ok(())
}

fn run_get(args: GetArgs) -> Result<()> {
    let format = args.output_format()?;
    let mut processor = args.sources.build_processor()?;
    let value = processor
        .get(&args.path)?
        .with_context(|| format!("No config value at '{}'", args.path))?;
    std::io::stdout().write_all(format.render_value(value)?.as_bytes())?;
    Ok(())
}
