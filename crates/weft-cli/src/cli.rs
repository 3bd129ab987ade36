//! CLI argument definitions for `weft`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use weft_config::LogFormat;

/// Formats code embedded in other code.
#[derive(Parser, Debug)]
#[command(name = "weft", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Reads configuration from this file instead of discovering `weft.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) config_path: Option<PathBuf>,
    /// Overrides the log filter (for example `weft_engine=debug`).
    #[arg(long, global = true, value_name = "FILTER")]
    pub(crate) log_filter: Option<String>,
    /// Overrides the log format (`json` or `compact`).
    #[arg(long, global = true, value_name = "FORMAT", value_parser = parse_log_format)]
    pub(crate) log_format: Option<LogFormat>,
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Subcommands for the `weft` CLI.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Formats files, or standard input when no file is given.
    Format(FormatArgs),
}

/// Arguments of `weft format`.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct FormatArgs {
    /// Host language of the inputs; inferred from file extensions if unset.
    #[arg(long, short = 'l', value_name = "LANGUAGE")]
    pub(crate) language: Option<String>,
    /// Line width handed to formatters as `$textwidth`.
    #[arg(long, value_name = "COLUMNS")]
    pub(crate) textwidth: Option<usize>,
    /// Maximum number of regions formatted concurrently.
    #[arg(long, short = 'j', value_name = "N")]
    pub(crate) jobs: Option<usize>,
    /// Reports inputs that would change instead of printing them.
    #[arg(long, conflicts_with = "write")]
    pub(crate) check: bool,
    /// Rewrites files in place instead of printing them.
    #[arg(long, short = 'w')]
    pub(crate) write: bool,
    /// Attempts every region and reports all failures.
    #[arg(long)]
    pub(crate) keep_going: bool,
    /// Files to format; `-` or no file reads standard input.
    #[arg(value_name = "FILE")]
    pub(crate) files: Vec<PathBuf>,
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value.parse().map_err(|_| format!("expected 'json' or 'compact', got '{value}'"))
}
