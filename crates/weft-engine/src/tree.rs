//! Nesting candidate regions by containment.
//!
//! Candidates found in one text are sorted by start offset, longer ranges
//! first on ties, and then grouped in a single pass: each top-level
//! candidate collects every candidate it strictly encloses. Those enclosed
//! candidates are nested again once the top-level region's text has been
//! extracted, so one pass per level is enough.

use std::ops::Range;

use weft_syntax::InjectionSpan;

use crate::error::{ConfigurationError, RegionContext};

/// A region that has been found but not yet placed in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Byte range in the text the candidate was found in.
    pub range: Range<usize>,
    /// Language label.
    pub language: String,
    /// Escape-sensitive character.
    pub escape: Option<char>,
}

impl Candidate {
    /// Creates a candidate.
    #[must_use]
    pub fn new(range: Range<usize>, language: impl Into<String>, escape: Option<char>) -> Self {
        Self {
            range,
            language: language.into(),
            escape,
        }
    }

    /// An empty range on the closing boundary follows the candidate rather
    /// than sitting inside it.
    fn encloses(&self, other: &Self) -> bool {
        self.range.start <= other.range.start
            && other.range.end <= self.range.end
            && other.range.start < self.range.end
    }

    fn context(&self, depth: usize) -> RegionContext {
        RegionContext::new(self.range.clone(), depth, self.language.clone())
    }
}

impl From<InjectionSpan> for Candidate {
    fn from(span: InjectionSpan) -> Self {
        Self {
            range: span.range,
            language: span.language,
            escape: span.escape,
        }
    }
}

/// A top-level candidate and everything it encloses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nested {
    /// The enclosing candidate.
    pub candidate: Candidate,
    /// Strictly enclosed candidates, still in the outer text's offsets.
    pub inner: Vec<Candidate>,
}

/// Groups `candidates` into non-overlapping top-level regions at `depth`.
///
/// Candidates with identical ranges, languages and escapes are merged, the
/// first one winning.
///
/// # Errors
///
/// Returns [`ConfigurationError::OverlappingRegions`] when two top-level
/// candidates partially overlap and
/// [`ConfigurationError::ConflictingLanguages`] when two candidates cover
/// the same range with different languages or escapes.
pub fn nest(
    mut candidates: Vec<Candidate>,
    depth: usize,
) -> Result<Vec<Nested>, ConfigurationError> {
    candidates.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.range.end.cmp(&a.range.end))
    });

    let mut nested: Vec<Nested> = Vec::new();
    for candidate in candidates {
        let Some(open) = nested.last_mut() else {
            nested.push(Nested {
                candidate,
                inner: Vec::new(),
            });
            continue;
        };

        if open.candidate.range == candidate.range {
            if open.candidate.language != candidate.language
                || open.candidate.escape != candidate.escape
            {
                return Err(ConfigurationError::ConflictingLanguages {
                    region: open.candidate.context(depth),
                    other_language: candidate.language,
                });
            }
        } else if open.candidate.encloses(&candidate) {
            open.inner.push(candidate);
        } else if candidate.range.start < open.candidate.range.end {
            return Err(ConfigurationError::OverlappingRegions {
                region: candidate.context(depth),
                other: open.candidate.context(depth),
            });
        } else {
            nested.push(Nested {
                candidate,
                inner: Vec::new(),
            });
        }
    }
    Ok(nested)
}
