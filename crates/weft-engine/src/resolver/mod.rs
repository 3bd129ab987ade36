//! Region resolution, the second phase of a run.
//!
//! Regions are resolved depth-first with children before parents. A
//! region's children are resolved first (siblings in parallel when a worker
//! pool is available), their replacements are spliced into the region's
//! local text, the region's formatter chain runs over the result and the
//! output is re-escaped for the parent. The replacement of the root region
//! is the finished document.
//!
//! After the first fatal failure the resolver stops dispatching new
//! regions; work already running finishes. In keep-going mode every region
//! is attempted and every failure reported.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use tracing::{debug, warn};
use weft_formatters::{FormatOptions, FormatterDispatch};

use crate::assemble;
use crate::error::{FailureCause, FormatRunError, RegionFailure};
use crate::escape;
use crate::policy::EnginePolicy;
use crate::region::{Region, RegionId, RegionTree};

const RESOLVER_TARGET: &str = "weft_engine::resolver";

/// Formatter name recorded for failures while splicing children.
const SPLICE_STEP: &str = "<splice>";

/// Resolves every region of one [`RegionTree`].
pub(crate) struct Resolver<'a> {
    tree: &'a RegionTree,
    formatters: &'a dyn FormatterDispatch,
    options: &'a FormatOptions,
    policy: &'a EnginePolicy,
    parallel: bool,
    cancelled: AtomicBool,
    failures: Mutex<Vec<RegionFailure>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        tree: &'a RegionTree,
        formatters: &'a dyn FormatterDispatch,
        options: &'a FormatOptions,
        policy: &'a EnginePolicy,
    ) -> Self {
        Self {
            tree,
            formatters,
            options,
            policy,
            parallel: policy.worker_limit > 1,
            cancelled: AtomicBool::new(false),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Resolves the whole tree, returning the finished document.
    ///
    /// Run this inside the worker pool for sibling fan-out to use it.
    pub(crate) fn run(self) -> Result<String, FormatRunError> {
        let document = self.resolve(self.tree.root());
        let failures = self
            .failures
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        match document {
            Some(text) if failures.is_empty() => Ok(text),
            _ => Err(FormatRunError::Formatting(failures)),
        }
    }

    fn resolve(&self, id: RegionId) -> Option<String> {
        let region = self.tree.get(id);
        let replacements = self.resolve_children(&region.children)?;
        if self.cancelled.load(Ordering::Acquire) {
            return None;
        }

        let local = match assemble::splice(&region.local, &replacements) {
            Ok(text) => text,
            Err(err) => {
                self.record(region, SPLICE_STEP, err.into());
                return None;
            }
        };
        let formatted = self.run_chain(region, local)?;
        Some(escape::reescape(&formatted, region.escape))
    }

    /// Resolves `children`, returning their ranges and replacements in
    /// order, or `None` if any child failed.
    fn resolve_children(&self, children: &[RegionId]) -> Option<Vec<(Range<usize>, String)>> {
        let resolved: Vec<Option<String>> = if self.parallel && children.len() > 1 {
            children.par_iter().map(|&child| self.resolve(child)).collect()
        } else {
            children.iter().map(|&child| self.resolve(child)).collect()
        };
        children
            .iter()
            .zip(resolved)
            .map(|(&child, text)| text.map(|t| (self.tree.get(child).range.clone(), t)))
            .collect()
    }

    fn run_chain(&self, region: &Region, local: String) -> Option<String> {
        let chain = self.formatters.formatters_for(&region.language);
        if chain.is_empty() {
            return Some(local);
        }

        let mut current: Option<String> = None;
        for formatter in chain {
            if self.cancelled.load(Ordering::Acquire) {
                return None;
            }
            debug!(
                target: RESOLVER_TARGET,
                region = %region.context(),
                formatter = %formatter,
                "running formatter"
            );
            let input = current.as_deref().unwrap_or(&local);
            match self.invoke(formatter, input) {
                Ok(output) => current = Some(output),
                Err(cause) => return self.fail(region, formatter, cause, local),
            }
        }
        current
    }

    fn invoke(&self, formatter: &str, input: &str) -> Result<String, FailureCause> {
        let output = self
            .formatters
            .invoke(formatter, input.as_bytes(), self.options)?;
        String::from_utf8(output).map_err(|_| FailureCause::NonUtf8Output)
    }

    /// Applies the failure policy to a formatter failure, returning the text
    /// to keep when the region passes through.
    fn fail(
        &self,
        region: &Region,
        formatter: &str,
        cause: FailureCause,
        local: String,
    ) -> Option<String> {
        if self.policy.passes_through() && !cause.is_plugin_load() {
            warn!(
                target: RESOLVER_TARGET,
                region = %region.context(),
                formatter,
                error = %cause,
                "formatter failed; keeping region unformatted"
            );
            return Some(local);
        }
        self.record(region, formatter, cause);
        None
    }

    fn record(&self, region: &Region, formatter: &str, cause: FailureCause) {
        let cancels = !self.policy.keep_going && !cause.is_plugin_load();
        debug!(
            target: RESOLVER_TARGET,
            region = %region.context(),
            formatter,
            error = %cause,
            cancels,
            "region failed"
        );
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RegionFailure {
                region: region.context(),
                formatter: formatter.to_owned(),
                cause,
            });
        if cancels {
            self.cancelled.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests;
