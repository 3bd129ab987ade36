//! CLI entrypoint for the `weft` formatter.
//!
//! The binary delegates to [`weft_cli::run`], which loads configuration,
//! parses arguments and formats the requested inputs.

use std::io::{self, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    // Stderr stays unlocked: log events from formatter workers write to it
    // while the run is in progress.
    let mut stderr = io::stderr();
    weft_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
