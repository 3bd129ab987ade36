//! Formatter backend descriptions.
//!
//! A formatter is either an external command that reads source on stdin and
//! writes the formatted result to stdout, or a plugin component exporting a
//! single `format` operation. [`FormatterBackend`] is the closed set of both
//! kinds; it deserialises from the shape used in configuration files:
//!
//! ```toml
//! [formatters.pg_format]
//! cmd = "pg_format"
//! args = ["--wrap-limit", "$textwidth", "-"]
//!
//! [formatters.sqlfmt]
//! plugin = "file:///usr/share/weft/sqlfmt.wasm"
//! ```

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Default timeout in seconds for external formatter commands.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// An external command formatter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    cmd: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl CommandSpec {
    /// Creates a command spec with the default timeout.
    #[must_use]
    pub fn new(cmd: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            cmd: cmd.into(),
            args,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Returns the program to run.
    #[must_use]
    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Returns the argument templates, which may contain `$` placeholders.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the timeout in seconds.
    #[must_use]
    pub const fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }
}

/// A reference to a loadable plugin component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginReference {
    plugin: String,
}

impl PluginReference {
    /// Creates a plugin reference from a URI-like string.
    #[must_use]
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
        }
    }

    /// Returns the reference string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.plugin
    }
}

impl std::fmt::Display for PluginReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.plugin)
    }
}

/// The two kinds of formatter backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormatterBackend {
    /// Pipe source through an external process.
    ExternalCommand(CommandSpec),
    /// Call a loaded plugin component.
    WasmPlugin(PluginReference),
}

impl FormatterBackend {
    /// Returns a short label for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExternalCommand(_) => "command",
            Self::WasmPlugin(_) => "plugin",
        }
    }
}

/// A formatter identifier bound to its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterDefinition {
    id: String,
    backend: FormatterBackend,
}

impl FormatterDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(id: impl Into<String>, backend: FormatterBackend) -> Self {
        Self {
            id: id.into(),
            backend,
        }
    }

    /// Returns the formatter identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &FormatterBackend {
        &self.backend
    }

    /// Rejects definitions that could never run.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Registry`] when the identifier, command or
    /// plugin reference is blank, or the timeout is zero.
    pub fn validate(&self) -> Result<(), FormatError> {
        let invalid = |reason: &str| FormatError::Registry {
            message: format!("formatter '{}': {reason}", self.id),
        };
        if self.id.trim().is_empty() {
            return Err(FormatError::Registry {
                message: String::from("formatter identifier must not be empty"),
            });
        }
        match &self.backend {
            FormatterBackend::ExternalCommand(spec) if spec.cmd.trim().is_empty() => {
                Err(invalid("command must not be empty"))
            }
            FormatterBackend::ExternalCommand(spec) if spec.timeout_secs == 0 => {
                Err(invalid("timeout must be at least one second"))
            }
            FormatterBackend::WasmPlugin(reference) if reference.plugin.trim().is_empty() => {
                Err(invalid("plugin reference must not be empty"))
            }
            FormatterBackend::ExternalCommand(_) | FormatterBackend::WasmPlugin(_) => Ok(()),
        }
    }
}
