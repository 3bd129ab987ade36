//! Injection resolution and recursive formatting for weft.
//!
//! The engine takes a host document, finds the regions of embedded language
//! inside it and hands each region to the formatters configured for its
//! language, innermost regions first. Formatted regions are re-escaped and
//! spliced back into their exact source ranges.
//!
//! # Phases
//!
//! A run has two phases:
//!
//! 1. **Discovery** asks an [`InjectionSource`] for the spans of every text,
//!    nests them by containment, extracts and unescapes each region and
//!    searches the extracted text for further regions. The result is a
//!    [`RegionTree`]. Configuration and extraction problems are collected
//!    and reported together; no formatter has run yet.
//! 2. **Resolution** walks the tree children-first through a
//!    [`FormatterDispatch`], fanning sibling regions out over a bounded
//!    worker pool, and assembles the finished document.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use weft_engine::{Engine, EnginePolicy};
//! use weft_formatters::{
//!     FormatOptions, FormatterRegistry, FormatterRunner, ProcessExecutor, UnavailablePluginLoader,
//! };
//! use weft_syntax::InjectionCatalog;
//!
//! let runner = FormatterRunner::new(
//!     FormatterRegistry::new(),
//!     ProcessExecutor,
//!     Arc::new(UnavailablePluginLoader),
//! );
//! let engine = Engine::new(
//!     InjectionCatalog::new(Vec::new()),
//!     runner,
//!     EnginePolicy::default(),
//!     FormatOptions::default(),
//! )?;
//! let formatted = engine.format_document("rust", "fn main() {}\n")?;
//! # Ok::<(), weft_engine::FormatRunError>(())
//! ```
//!
//! [`InjectionSource`]: weft_syntax::InjectionSource
//! [`FormatterDispatch`]: weft_formatters::FormatterDispatch

pub mod assemble;
mod discover;
mod engine;
pub mod error;
pub mod escape;
mod policy;
mod region;
mod resolver;
pub mod tree;

#[cfg(test)]
mod tests;

pub use self::engine::Engine;
pub use self::error::{
    AssemblyError, ConfigurationError, ExtractionError, FailureCause, FormatRunError,
    RegionContext, RegionFailure,
};
pub use self::policy::{DEFAULT_MAX_DEPTH, EnginePolicy, FailurePolicy, default_worker_limit};
pub use self::region::{Region, RegionId, RegionTree};
