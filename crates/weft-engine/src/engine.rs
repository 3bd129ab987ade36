//! The formatting engine entry point.

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;
use weft_formatters::{FormatOptions, FormatterDispatch};
use weft_syntax::InjectionSource;

use crate::discover::discover;
use crate::error::FormatRunError;
use crate::policy::EnginePolicy;
use crate::region::RegionTree;
use crate::resolver::Resolver;

const ENGINE_TARGET: &str = "weft_engine::engine";

/// Formats documents by resolving their embedded regions.
///
/// An engine is built once per run and may format any number of documents.
/// It owns the worker pool used for sibling fan-out; with a worker limit of
/// one, regions are resolved by plain sequential recursion.
#[derive(Debug)]
pub struct Engine<S, D> {
    injections: S,
    formatters: D,
    policy: EnginePolicy,
    options: FormatOptions,
    pool: Option<ThreadPool>,
}

impl<S, D> Engine<S, D>
where
    S: InjectionSource,
    D: FormatterDispatch,
{
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`FormatRunError::WorkerPool`] if the worker pool cannot be
    /// started.
    pub fn new(
        injections: S,
        formatters: D,
        policy: EnginePolicy,
        options: FormatOptions,
    ) -> Result<Self, FormatRunError> {
        let pool = if policy.worker_limit > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(policy.worker_limit)
                    .thread_name(|index| format!("weft-worker-{index}"))
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self {
            injections,
            formatters,
            policy,
            options,
            pool,
        })
    }

    /// Returns the run policy.
    #[must_use]
    pub const fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Returns the options passed to every formatter.
    #[must_use]
    pub const fn options(&self) -> &FormatOptions {
        &self.options
    }

    /// Returns the formatter dispatch.
    #[must_use]
    pub const fn formatters(&self) -> &D {
        &self.formatters
    }

    /// Discovers the regions of `source` without formatting anything.
    ///
    /// # Errors
    ///
    /// Returns a configuration or extraction error describing every problem
    /// found in the document.
    pub fn discover(&self, language: &str, source: &str) -> Result<RegionTree, FormatRunError> {
        discover(
            &self.injections,
            &self.formatters,
            &self.policy,
            language,
            source,
        )
    }

    /// Formats `source`, written in `language`, returning the whole new
    /// document.
    ///
    /// All regions are discovered and validated before the first formatter
    /// runs. No partial document is returned on failure.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatRunError`] aggregating every configuration,
    /// extraction or formatter problem of the run.
    pub fn format_document(&self, language: &str, source: &str) -> Result<String, FormatRunError> {
        let tree = self.discover(language, source)?;
        debug!(
            target: ENGINE_TARGET,
            language,
            regions = tree.len() - 1,
            max_depth = ?tree.max_depth(),
            "discovered embedded regions"
        );

        let resolver = Resolver::new(&tree, &self.formatters, &self.options, &self.policy);
        let formatted = match &self.pool {
            Some(pool) => pool.install(|| resolver.run()),
            None => resolver.run(),
        }?;

        debug!(
            target: ENGINE_TARGET,
            language,
            changed = formatted != source,
            "formatted document"
        );
        Ok(formatted)
    }
}
