// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Parser, ValueEnum};

use crate::types::Target;

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build front-end assets and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run: an asset class, `building`, `watching`, `build` (clean
    /// then building) or `default` (every asset class, then watching).
    #[arg(
        value_name = "TASK",
        default_value = "default",
        value_parser = PossibleValuesParser::new(Target::NAMES)
    )]
    pub task: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetdag.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the plan, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// The parsed task; clap already restricted it to known names.
    pub fn target(&self) -> Result<Target, String> {
        self.task.parse()
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
