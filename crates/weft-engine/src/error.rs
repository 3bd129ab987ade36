//! Error types for a formatting run.
//!
//! Errors fall into three families that are raised at different points of a
//! run. Configuration and extraction problems are found while regions are
//! discovered and abort the run before any formatter is started. Formatter
//! failures are collected while regions are resolved. Every family is
//! aggregated so a single run reports all of its problems at once.

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use weft_formatters::FormatError;
use weft_syntax::{ExtractionFault, InjectionError};

/// Location of a region within the text of its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionContext {
    /// Byte range in the parent's local text (or the host document).
    pub range: Range<usize>,
    /// Nesting depth, with 0 for regions found directly in the host. `None`
    /// for the host document itself.
    pub depth: Option<usize>,
    /// Language label of the region.
    pub language: String,
}

impl RegionContext {
    /// Creates the context of an embedded region.
    #[must_use]
    pub fn new(range: Range<usize>, depth: usize, language: impl Into<String>) -> Self {
        Self {
            range,
            depth: Some(depth),
            language: language.into(),
        }
    }

    /// Creates the context of the host document.
    #[must_use]
    pub fn host(range: Range<usize>, language: impl Into<String>) -> Self {
        Self {
            range,
            depth: None,
            language: language.into(),
        }
    }
}

impl fmt::Display for RegionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.depth {
            Some(depth) => write!(
                f,
                "{} region at {}..{} (depth {depth})",
                self.language, self.range.start, self.range.end
            ),
            None => write!(
                f,
                "{} host document at {}..{}",
                self.language, self.range.start, self.range.end
            ),
        }
    }
}

/// A problem with queries, regions or policy that prevents formatting.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The injection query for a language could not be used.
    #[error("injection query for {language} is unusable: {source}")]
    Query {
        /// Language whose query failed.
        language: String,
        /// Underlying query error.
        #[source]
        source: InjectionError,
    },

    /// Two regions at the same depth partially overlap.
    #[error("{region} partially overlaps {other}")]
    OverlappingRegions {
        /// The region that starts later.
        region: RegionContext,
        /// The region it overlaps.
        other: RegionContext,
    },

    /// Two matches cover the same range with different languages.
    #[error("{region} is also claimed by {other_language}")]
    ConflictingLanguages {
        /// The first region claiming the range.
        region: RegionContext,
        /// Language of the later match.
        other_language: String,
    },

    /// Strict mode found a region with no formatter configured.
    #[error("{region} has no formatter configured")]
    UnformattedLanguage {
        /// The unformatted region.
        region: RegionContext,
    },

    /// Regions are nested deeper than the policy allows.
    #[error("{region} exceeds the maximum nesting depth of {max_depth}")]
    NestingTooDeep {
        /// The offending region.
        region: RegionContext,
        /// Configured maximum depth.
        max_depth: usize,
    },
}

/// A region whose text cannot be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// An offset adjustment produced an invalid range.
    #[error("at depth {depth}: {fault}")]
    Offset {
        /// Depth of the text the match was found in.
        depth: usize,
        /// Details from the directive interpreter.
        fault: ExtractionFault,
    },

    /// A nested region boundary falls inside an escape sequence of its
    /// parent.
    #[error("{region} splits an escape sequence for '{escape}' in its parent")]
    SplitEscape {
        /// The nested region, located in the parent's host text.
        region: RegionContext,
        /// Escape character of the parent.
        escape: char,
    },

    /// A region range does not select text from its parent.
    #[error("{region} does not select valid text")]
    InvalidRange {
        /// The region.
        region: RegionContext,
    },
}

/// A splice range that does not fit the text being assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("replacement range {}..{} does not fit the text", .range.start, .range.end)]
pub struct AssemblyError {
    /// The range that could not be applied.
    pub range: Range<usize>,
}

/// Why a region could not be formatted.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// The formatter backend failed.
    #[error(transparent)]
    Formatter(#[from] FormatError),

    /// The formatter produced bytes that are not UTF-8.
    #[error("formatter output is not valid UTF-8")]
    NonUtf8Output,

    /// Child replacements could not be spliced into the region.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

impl FailureCause {
    /// Returns whether the failure comes from loading a plugin rather than
    /// running a formatter.
    #[must_use]
    pub const fn is_plugin_load(&self) -> bool {
        matches!(self, Self::Formatter(FormatError::PluginLoad { .. }))
    }
}

/// A region whose formatting failed.
#[derive(Debug, Error)]
#[error("{region}: formatter '{formatter}' failed: {cause}")]
pub struct RegionFailure {
    /// The failing region.
    pub region: RegionContext,
    /// Identifier of the failing formatter, or `<splice>` for assembly
    /// failures.
    pub formatter: String,
    /// What went wrong.
    #[source]
    pub cause: FailureCause,
}

/// Outcome of a failed formatting run.
#[derive(Debug, Error)]
pub enum FormatRunError {
    /// Queries, regions or policy are invalid.
    #[error("invalid configuration: {}", join(.0))]
    Configuration(Vec<ConfigurationError>),

    /// Region text could not be extracted.
    #[error("cannot extract embedded regions: {}", join(.0))]
    Extraction(Vec<ExtractionError>),

    /// One or more regions failed to format.
    #[error("formatting failed: {}", join(.0))]
    Formatting(Vec<RegionFailure>),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl FormatRunError {
    /// Returns the number of individual problems carried by this error.
    #[must_use]
    pub const fn count(&self) -> usize {
        match self {
            Self::Configuration(errors) => errors.len(),
            Self::Extraction(errors) => errors.len(),
            Self::Formatting(failures) => failures.len(),
            Self::WorkerPool(_) => 1,
        }
    }
}

fn join<E: fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
