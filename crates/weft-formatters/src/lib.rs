//! Formatter definitions and invocation for Weft.
//!
//! The `weft-formatters` crate owns everything that sits between the
//! formatting engine and the tools that actually reformat text. A formatter
//! is either an **external command**, which receives the region on standard
//! input and writes the formatted text to standard output, or a **plugin
//! component**, which exports a single `format` operation.
//!
//! # Architecture
//!
//! Formatter definitions are validated into a [`FormatterRegistry`], which
//! also records the ordered formatter chain for each language. The engine
//! reaches formatters only through the [`FormatterDispatch`] trait;
//! [`FormatterRunner`] is the production implementation. It expands argument
//! placeholders such as `$textwidth` from [`FormatOptions`] and hands the
//! call to a [`CommandExecutor`] or to the run-scoped [`PluginPool`].
//! Plugin components are instantiated by a [`PluginLoader`];
//! [`ComponentLoader`] runs them on wasmtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use weft_formatters::process::ProcessExecutor;
//! use weft_formatters::{
//!     CommandSpec, ComponentLoader, FormatOptions, FormatterBackend, FormatterDefinition,
//!     FormatterDispatch, FormatterRegistry, FormatterRunner,
//! };
//!
//! let mut registry = FormatterRegistry::new();
//! registry
//!     .register(FormatterDefinition::new(
//!         "pg_format",
//!         FormatterBackend::ExternalCommand(CommandSpec::new("pg_format", vec!["-".into()])),
//!     ))
//!     .expect("registration succeeds");
//! registry
//!     .assign("sql", vec!["pg_format".into()])
//!     .expect("chain is valid");
//!
//! let runner = FormatterRunner::new(registry, ProcessExecutor, Arc::new(ComponentLoader::new()));
//! let formatted = runner.invoke("pg_format", b"select 1", &FormatOptions::default());
//! ```

pub mod backend;
pub mod error;
pub mod options;
pub mod plugin;
pub mod process;
pub mod registry;
pub mod runner;
pub mod wasm;

#[cfg(test)]
mod tests;

pub use self::backend::{
    CommandSpec, DEFAULT_TIMEOUT_SECS, FormatterBackend, FormatterDefinition, PluginReference,
};
pub use self::error::FormatError;
pub use self::options::{DEFAULT_TEXTWIDTH, FormatOptions};
pub use self::plugin::{PluginInstance, PluginLoader, PluginPool, UnavailablePluginLoader};
pub use self::process::ProcessExecutor;
pub use self::registry::FormatterRegistry;
pub use self::runner::{CommandExecutor, FormatterDispatch, FormatterRunner};
pub use self::wasm::ComponentLoader;
