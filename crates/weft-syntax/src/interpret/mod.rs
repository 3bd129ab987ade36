//! Converts capture sets into injection spans.
//!
//! For every match the interpreter runs the pattern's predicates first, so a
//! match rejected by `#match?` never has its directives applied. Surviving
//! matches run their directives to build a [`RegionDraft`], receive a
//! language label (from `#set!` or a dynamic `@injection.language` capture)
//! and have any `#offset!` adjustment applied to the `@injection.content`
//! range. Matches without a content capture or a language are discarded.
//!
//! An adjustment that produces an unusable range is not dropped: it is
//! reported as an [`ExtractionFault`] so the caller can fail the run instead
//! of silently leaving text unformatted.

use std::fmt;
use std::ops::Range;

use thiserror::Error;
use tracing::debug;

use crate::capture::{CaptureSet, CONTENT_CAPTURE, LANGUAGE_CAPTURE};
use crate::directive::{
    DirectiveContext, DirectiveOutcome, DirectiveRegistry, OffsetAdjustment, RegionDraft,
};
use crate::error::InjectionError;
use crate::position::LineIndex;

const INTERPRET_TARGET: &str = "weft_syntax::interpret";

/// A region of embedded language found by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionSpan {
    /// Byte range after offset adjustment.
    pub range: Range<usize>,
    /// Byte range of the captured node before adjustment.
    pub raw_range: Range<usize>,
    /// Language label of the embedded text.
    pub language: String,
    /// Escape-sensitive character, if the query registered one.
    pub escape: Option<char>,
    /// Adjustment that produced `range` from `raw_range`.
    pub offset: Option<OffsetAdjustment>,
    /// Index of the query pattern that matched.
    pub pattern_index: usize,
}

/// Why an offset adjustment could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultReason {
    /// A boundary moved before the start or past the end of the text.
    OutOfBounds,
    /// The adjusted start lies after the adjusted end.
    NegativeLength,
    /// A boundary falls inside a multi-byte character.
    SplitCharacter,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OutOfBounds => "moves a boundary outside the text",
            Self::NegativeLength => "produces a negative-length range",
            Self::SplitCharacter => "splits a multi-byte character",
        })
    }
}

/// A match whose offset adjustment yielded an invalid range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("offset {offset:?} applied to {language} capture at {raw_range:?} {reason}")]
pub struct ExtractionFault {
    /// Byte range of the captured node.
    pub raw_range: Range<usize>,
    /// Language label the region would have had.
    pub language: String,
    /// The offending adjustment.
    pub offset: OffsetAdjustment,
    /// What went wrong.
    pub reason: FaultReason,
}

/// Spans and faults found in one text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Interpretation {
    /// Usable injection spans in match order.
    pub spans: Vec<InjectionSpan>,
    /// Matches whose adjusted range is invalid.
    pub faults: Vec<ExtractionFault>,
}

impl Interpretation {
    /// Returns whether nothing was found.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.spans.is_empty() && self.faults.is_empty()
    }
}

/// Interprets the capture sets produced by query `query` over `source`.
///
/// # Errors
///
/// Returns an [`InjectionError`] when a directive handler rejects its
/// arguments. Calls are validated when a query is compiled, so this only
/// happens for capture sets built by hand.
pub fn interpret(
    query: &str,
    sets: &[CaptureSet],
    source: &str,
    registry: &DirectiveRegistry,
) -> Result<Interpretation, InjectionError> {
    let index = LineIndex::new(source);
    let mut interpretation = Interpretation::default();

    for set in sets {
        let Some(draft) = evaluate(query, set, source, registry)? else {
            continue;
        };
        let Some(content) = set.capture(CONTENT_CAPTURE) else {
            debug!(
                target: INTERPRET_TARGET,
                pattern = set.pattern_index(),
                "match has no @{CONTENT_CAPTURE} capture"
            );
            continue;
        };
        let Some(language) = draft.language.or_else(|| dynamic_language(set, source)) else {
            debug!(
                target: INTERPRET_TARGET,
                pattern = set.pattern_index(),
                "match has no injection language"
            );
            continue;
        };

        let raw_range = content.byte_range();
        let range = match draft.offset {
            None => raw_range.clone(),
            Some(offset) => match adjust(&index, source, &raw_range, offset) {
                Ok(range) => range,
                Err(reason) => {
                    interpretation.faults.push(ExtractionFault {
                        raw_range,
                        language,
                        offset,
                        reason,
                    });
                    continue;
                }
            },
        };

        interpretation.spans.push(InjectionSpan {
            range,
            raw_range,
            language,
            escape: draft.escape,
            offset: draft.offset,
            pattern_index: set.pattern_index(),
        });
    }
    Ok(interpretation)
}

fn evaluate(
    query: &str,
    set: &CaptureSet,
    source: &str,
    registry: &DirectiveRegistry,
) -> Result<Option<RegionDraft>, InjectionError> {
    let context = DirectiveContext {
        captures: set,
        source,
        registry,
    };
    let mut draft = RegionDraft::default();

    let (predicates, directives): (Vec<_>, Vec<_>) = set
        .directives()
        .iter()
        .partition(|call| call.is_predicate());

    for call in predicates.into_iter().chain(directives) {
        if registry.apply(query, call, &context, &mut draft)? == DirectiveOutcome::Discard {
            return Ok(None);
        }
    }
    Ok(Some(draft))
}

fn dynamic_language(set: &CaptureSet, source: &str) -> Option<String> {
    let text = set.capture(LANGUAGE_CAPTURE)?.text(source).trim();
    (!text.is_empty()).then(|| text.to_ascii_lowercase())
}

fn adjust(
    index: &LineIndex,
    source: &str,
    raw: &Range<usize>,
    offset: OffsetAdjustment,
) -> Result<Range<usize>, FaultReason> {
    let shift = |byte: usize, rows: i64, columns: i64| {
        index
            .point(byte)
            .and_then(|point| point.shifted(rows, columns))
            .and_then(|point| index.offset(point))
            .ok_or(FaultReason::OutOfBounds)
    };
    let start = shift(raw.start, offset.start_row, offset.start_column)?;
    let end = shift(raw.end, offset.end_row, offset.end_column)?;

    if start > end {
        return Err(FaultReason::NegativeLength);
    }
    if !source.is_char_boundary(start) || !source.is_char_boundary(end) {
        return Err(FaultReason::SplitCharacter);
    }
    Ok(start..end)
}
