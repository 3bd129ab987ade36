//! Formatter runner dispatching invocations to their backend.
//!
//! The [`FormatterRunner`] is the public-facing API the formatting engine
//! calls through the [`FormatterDispatch`] trait. It resolves a formatter by
//! identifier from the [`FormatterRegistry`], expands argument placeholders
//! and delegates to a [`CommandExecutor`] for external commands or to the
//! [`PluginPool`] for plugin components.
//!
//! The executor abstraction enables test doubles that return pre-configured
//! output without spawning real processes.

use std::sync::Arc;

use tracing::debug;

use crate::backend::{CommandSpec, FormatterBackend};
use crate::error::FormatError;
use crate::options::FormatOptions;
use crate::plugin::{PluginLoader, PluginPool};
use crate::registry::FormatterRegistry;

/// Tracing target for dispatch operations.
const RUNNER_TARGET: &str = "weft_formatters::runner";

/// Trait abstracting external command execution for testability.
///
/// The production implementation is
/// [`ProcessExecutor`](crate::process::ProcessExecutor), which spawns a child
/// process. Test code can implement this trait to inject pre-configured
/// output.
///
/// # Example
///
/// ```
/// use weft_formatters::{CommandExecutor, CommandSpec, FormatError};
///
/// struct EchoExecutor;
///
/// impl CommandExecutor for EchoExecutor {
///     fn run(
///         &self,
///         _spec: &CommandSpec,
///         _args: &[String],
///         input: &[u8],
///     ) -> Result<Vec<u8>, FormatError> {
///         Ok(input.to_vec())
///     }
/// }
/// ```
pub trait CommandExecutor: Send + Sync {
    /// Runs `spec` with the already-expanded `args`, feeding `input` on stdin
    /// and returning everything written to stdout.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] if the command cannot be spawned, times out,
    /// exits unsuccessfully or writes diagnostics.
    fn run(&self, spec: &CommandSpec, args: &[String], input: &[u8])
    -> Result<Vec<u8>, FormatError>;
}

/// Uniform call surface the engine uses to reach formatters.
pub trait FormatterDispatch: Send + Sync {
    /// Returns the ordered formatter chain configured for `language`.
    fn formatters_for(&self, language: &str) -> &[String];

    /// Runs a single formatter over `input`.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`] when the formatter is unknown or its
    /// backend fails.
    fn invoke(
        &self,
        formatter: &str,
        input: &[u8],
        options: &FormatOptions,
    ) -> Result<Vec<u8>, FormatError>;
}

/// Dispatches formatter invocations to external commands and plugins.
#[derive(Debug)]
pub struct FormatterRunner<E> {
    registry: FormatterRegistry,
    executor: E,
    plugins: PluginPool,
}

impl<E> FormatterRunner<E> {
    /// Creates a runner with the given registry, command executor and
    /// plugin loader.
    #[must_use]
    pub fn new(registry: FormatterRegistry, executor: E, loader: Arc<dyn PluginLoader>) -> Self {
        Self {
            registry,
            executor,
            plugins: PluginPool::new(loader),
        }
    }

    /// Returns a reference to the formatter registry.
    #[must_use]
    pub const fn registry(&self) -> &FormatterRegistry {
        &self.registry
    }
}

impl<E: CommandExecutor> FormatterDispatch for FormatterRunner<E> {
    fn formatters_for(&self, language: &str) -> &[String] {
        self.registry.formatters_for(language)
    }

    fn invoke(
        &self,
        formatter: &str,
        input: &[u8],
        options: &FormatOptions,
    ) -> Result<Vec<u8>, FormatError> {
        let definition =
            self.registry
                .get(formatter)
                .ok_or_else(|| FormatError::UnknownFormatter {
                    id: formatter.to_owned(),
                })?;

        debug!(
            target: RUNNER_TARGET,
            formatter,
            backend = definition.backend().kind(),
            input_bytes = input.len(),
            "invoking formatter"
        );

        match definition.backend() {
            FormatterBackend::ExternalCommand(spec) => {
                let args = options.substitute_all(spec.args());
                self.executor.run(spec, &args, input)
            }
            FormatterBackend::WasmPlugin(reference) => {
                self.plugins.format(reference, input, options)
            }
        }
    }
}
