//! Run policy for the formatting engine.

use std::num::NonZeroUsize;
use std::thread;

use serde::{Deserialize, Serialize};

/// Default maximum nesting depth of embedded regions.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// What to do when a formatter fails on a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail the run.
    #[default]
    Fail,
    /// Keep the region's text unformatted and log a warning.
    Passthrough,
}

/// Knobs controlling one formatting run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnginePolicy {
    /// Maximum number of regions formatted concurrently; 1 disables
    /// parallelism.
    pub worker_limit: usize,
    /// Deepest nesting level accepted.
    pub max_depth: usize,
    /// Treat regions without formatters as configuration errors.
    pub strict: bool,
    /// Keep resolving after a failure so every failing region is reported.
    pub keep_going: bool,
    /// Handling of formatter failures.
    pub on_formatter_failure: FailurePolicy,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            worker_limit: default_worker_limit(),
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
            keep_going: false,
            on_formatter_failure: FailurePolicy::Fail,
        }
    }
}

impl EnginePolicy {
    /// Sets the worker limit, clamped to at least one.
    #[must_use]
    pub fn with_worker_limit(mut self, worker_limit: usize) -> Self {
        self.worker_limit = worker_limit.max(1);
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables or disables strict mode.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enables or disables keep-going mode.
    #[must_use]
    pub const fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Sets the formatter failure policy.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.on_formatter_failure = policy;
        self
    }

    /// Returns whether formatter failures keep the unformatted text.
    #[must_use]
    pub const fn passes_through(&self) -> bool {
        matches!(self.on_formatter_failure, FailurePolicy::Passthrough)
    }
}

/// Returns the number of available CPUs, or 1 when unknown.
#[must_use]
pub fn default_worker_limit() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
