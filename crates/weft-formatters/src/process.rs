//! External command execution.
//!
//! [`ProcessExecutor`] implements the [`CommandExecutor`] trait by spawning
//! the formatter command with all three standard streams piped, writing the
//! source to stdin from a helper thread, collecting stdout and stderr on two
//! more threads and enforcing the command's timeout while waiting for exit.
//! Feeding and draining the pipes concurrently keeps a formatter that writes
//! before it has read all its input from deadlocking on a full pipe buffer.

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::backend::CommandSpec;
use crate::error::FormatError;
use crate::runner::CommandExecutor;

/// Tracing target for formatter process operations.
const PROCESS_TARGET: &str = "weft_formatters::process";

/// Interval between exit status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs external formatter commands as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn run(&self, spec: &CommandSpec, args: &[String], input: &[u8]) -> Result<Vec<u8>, FormatError> {
        run_command(spec, args, input)
    }
}

/// Collected results of a finished child process.
struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    write_error: Option<std::io::Error>,
}

fn run_command(spec: &CommandSpec, args: &[String], input: &[u8]) -> Result<Vec<u8>, FormatError> {
    let cmd = spec.cmd();
    debug!(
        target: PROCESS_TARGET,
        cmd,
        ?args,
        input_bytes = input.len(),
        "spawning formatter process"
    );

    let mut child = Command::new(cmd)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| FormatError::SpawnFailed {
            cmd: cmd.to_owned(),
            message: err.to_string(),
            source: Some(Arc::new(err)),
        })?;

    let start = Instant::now();
    let finished = communicate(cmd, &mut child, input, spec.timeout_secs())?;
    debug!(
        target: PROCESS_TARGET,
        cmd,
        status = ?finished.status,
        output_bytes = finished.stdout.len(),
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "formatter process exited"
    );

    if !finished.status.success() || !finished.stderr.is_empty() {
        return Err(FormatError::ExternalToolFailed {
            cmd: cmd.to_owned(),
            exit_code: finished.status.code(),
            diagnostics: String::from_utf8_lossy(&finished.stderr).trim().to_owned(),
        });
    }
    if let Some(err) = finished.write_error {
        return Err(FormatError::io(cmd, err));
    }
    Ok(finished.stdout)
}

fn missing_pipe(cmd: &str, stream: &str) -> FormatError {
    FormatError::SpawnFailed {
        cmd: cmd.to_owned(),
        message: format!("failed to capture {stream}"),
        source: None,
    }
}

fn communicate(
    cmd: &str,
    child: &mut Child,
    input: &[u8],
    timeout_secs: u64,
) -> Result<Finished, FormatError> {
    let mut stdin = child.stdin.take().ok_or_else(|| missing_pipe(cmd, "stdin"))?;
    let mut stdout = child.stdout.take().ok_or_else(|| missing_pipe(cmd, "stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing_pipe(cmd, "stderr"))?;

    thread::scope(|scope| {
        let writer = scope.spawn(move || {
            // Dropping stdin at the end of the closure closes the pipe.
            stdin.write_all(input).and_then(|()| stdin.flush())
        });
        let out_reader = scope.spawn(move || {
            let mut buffer = Vec::new();
            stdout.read_to_end(&mut buffer).map(|_| buffer)
        });
        let err_reader = scope.spawn(move || {
            let mut buffer = Vec::new();
            stderr.read_to_end(&mut buffer).map(|_| buffer)
        });

        let status = wait_for_exit(cmd, child, timeout_secs)?;

        let joined = |what: &str| FormatError::SpawnFailed {
            cmd: cmd.to_owned(),
            message: format!("{what} thread panicked"),
            source: None,
        };
        let write_result = writer.join().map_err(|_| joined("stdin writer"))?;
        let stdout_bytes = out_reader
            .join()
            .map_err(|_| joined("stdout reader"))?
            .map_err(|err| FormatError::io(cmd, err))?;
        let stderr_bytes = err_reader
            .join()
            .map_err(|_| joined("stderr reader"))?
            .map_err(|err| FormatError::io(cmd, err))?;

        Ok(Finished {
            status,
            stdout: stdout_bytes,
            stderr: stderr_bytes,
            write_error: write_result
                .err()
                .filter(|err| err.kind() != ErrorKind::BrokenPipe),
        })
    })
}

/// Waits for the child process to exit, enforcing the timeout.
fn wait_for_exit(cmd: &str, child: &mut Child, timeout_secs: u64) -> Result<ExitStatus, FormatError> {
    let start = Instant::now();
    let timeout = Duration::from_secs(timeout_secs);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if start.elapsed() > timeout {
                    warn!(
                        target: PROCESS_TARGET,
                        cmd,
                        timeout_secs,
                        "formatter timed out, killing process"
                    );
                    drop(child.kill());
                    drop(child.wait());
                    return Err(FormatError::Timeout {
                        cmd: cmd.to_owned(),
                        timeout_secs,
                    });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => return Err(FormatError::io(cmd, err)),
        }
    }
}
