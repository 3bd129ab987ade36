//! Domain errors raised by formatter invocation.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can report which backend failed and why. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::sync::Arc;

use thiserror::Error;

/// Errors arising from formatter registration and invocation.
#[derive(Debug, Error)]
pub enum FormatError {
    /// An external command exited unsuccessfully or wrote diagnostics.
    #[error("formatter command '{cmd}' failed{}: {diagnostics}", exit_suffix(.exit_code.as_ref()))]
    ExternalToolFailed {
        /// Command that was run.
        cmd: String,
        /// Exit code, when the process exited normally.
        exit_code: Option<i32>,
        /// Text the process wrote to its diagnostic stream.
        diagnostics: String,
    },

    /// The formatter process could not be spawned.
    #[error("formatter command '{cmd}' failed to start: {message}")]
    SpawnFailed {
        /// Command that was run.
        cmd: String,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// An I/O error occurred while communicating with the formatter process.
    #[error("I/O error communicating with formatter command '{cmd}': {source}")]
    Io {
        /// Command that was run.
        cmd: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The formatter did not complete within its timeout.
    #[error("formatter command '{cmd}' timed out after {timeout_secs}s")]
    Timeout {
        /// Command that was run.
        cmd: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// A plugin returned its error variant.
    #[error("formatter plugin '{plugin_id}' failed: {message}")]
    PluginFailed {
        /// Plugin reference.
        plugin_id: String,
        /// Message returned by the plugin.
        message: String,
    },

    /// A plugin component could not be loaded or instantiated.
    #[error("formatter plugin '{plugin_id}' could not be loaded: {message}")]
    PluginLoad {
        /// Plugin reference.
        plugin_id: String,
        /// Description of the load failure.
        message: String,
    },

    /// No formatter with the requested identifier is registered.
    #[error("formatter '{id}' is not registered")]
    UnknownFormatter {
        /// Identifier that was looked up.
        id: String,
    },

    /// A formatter definition or language assignment is invalid.
    #[error("formatter registry error: {message}")]
    Registry {
        /// Description of the validation failure.
        message: String,
    },
}

impl FormatError {
    /// Creates an I/O error for `cmd`.
    #[must_use]
    pub fn io(cmd: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            cmd: cmd.into(),
            source: Arc::new(source),
        }
    }

    /// Returns whether the error comes from configuration rather than from
    /// running a formatter.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::UnknownFormatter { .. } | Self::Registry { .. })
    }
}

fn exit_suffix(exit_code: Option<&i32>) -> String {
    exit_code.map_or_else(
        || String::from(" (terminated by signal)"),
        |code| format!(" with exit code {code}"),
    )
}
