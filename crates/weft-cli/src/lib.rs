//! Command-line runtime for `weft`.
//!
//! The module owns argument parsing, configuration bootstrapping and
//! telemetry, then hands the parsed command to its runner. IO streams are
//! passed in so tests can drive the whole CLI in-process.
//!
//! ```text
//! weft [--config-path PATH] [--log-filter FILTER] [--log-format FORMAT]
//!      format [--language L] [--textwidth N] [--jobs N]
//!             [--check | --write] [--keep-going] [FILE...]
//! ```

use std::ffi::OsString;
use std::fmt::Display;
use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod config;
mod errors;
mod format;
pub mod telemetry;

#[cfg(test)]
mod tests;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, ProcessConfigLoader, apply_overrides};
use errors::AppError;

/// Exit status for malformed command lines.
const USAGE_EXIT_CODE: u8 = 2;

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, R, W, E> {
    pub(crate) stdin: &'a mut R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Formatted documents go to `stdout`; diagnostics and logs go to
/// `stderr`. The exit code is zero on success, one when any input failed
/// or, in check mode, would change, and two for usage errors.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
{
    let mut io = IoStreams {
        stdin,
        stdout,
        stderr,
    };
    run_with_loader(args, &mut io, &ProcessConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, io),
    };
    match execute(&cli, io, loader) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            report(io.stderr, &error);
            ExitCode::FAILURE
        }
    }
}

fn execute<R, W, E, L>(
    cli: &Cli,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> Result<ExitCode, AppError>
where
    R: Read,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let mut config = loader.load(cli.config_path.as_deref())?;
    apply_overrides(cli, &mut config)?;
    telemetry::initialise(&config)?;
    match &cli.command {
        CliCommand::Format(args) => format::run(args, &config, io),
    }
}

/// Writes clap's rendering of `error`; help and version go to stdout.
fn report_usage<R, W, E>(error: &clap::Error, io: &mut IoStreams<'_, R, W, E>) -> ExitCode
where
    W: Write,
    E: Write,
{
    let rendered = error.render();
    if error.use_stderr() {
        write!(io.stderr, "{rendered}").ok();
        ExitCode::from(USAGE_EXIT_CODE)
    } else {
        write!(io.stdout, "{rendered}").ok();
        ExitCode::SUCCESS
    }
}

pub(crate) fn report<E: Write>(stderr: &mut E, error: &impl Display) {
    writeln!(stderr, "weft: {error}").ok();
}
