//! Grammar-independent capture sets.
//!
//! The query matcher converts every Tree-sitter match into a [`CaptureSet`]:
//! the named captures with their byte ranges and points, plus the directive
//! calls attached to the pattern that matched. Nothing here borrows the
//! syntax tree, so capture sets outlive the parse that produced them and can
//! be built by hand in tests.

use std::ops::Range;

use crate::position::TextPoint;

/// Name of the capture that marks injected content.
pub const CONTENT_CAPTURE: &str = "injection.content";

/// Name of the capture whose text names the injected language.
pub const LANGUAGE_CAPTURE: &str = "injection.language";

/// A single named node match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    name: String,
    byte_range: Range<usize>,
    start: TextPoint,
    end: TextPoint,
}

impl Capture {
    /// Creates a capture.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        byte_range: Range<usize>,
        start: TextPoint,
        end: TextPoint,
    ) -> Self {
        Self {
            name: name.into(),
            byte_range,
            start,
            end,
        }
    }

    /// Returns the capture name without the leading `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the byte range of the captured node.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_range.clone()
    }

    /// Returns the start point of the captured node.
    #[must_use]
    pub const fn start(&self) -> TextPoint {
        self.start
    }

    /// Returns the end point of the captured node.
    #[must_use]
    pub const fn end(&self) -> TextPoint {
        self.end
    }

    /// Returns the captured text within `source`, or an empty string when the
    /// range does not address `source`.
    #[must_use]
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.byte_range.clone()).unwrap_or_default()
    }
}

/// One argument of a directive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveArg {
    /// A capture reference (`@name`), stored without the `@`.
    Capture(String),
    /// A literal string or bare word.
    Literal(String),
}

impl DirectiveArg {
    /// Returns the capture name when the argument is a capture reference.
    #[must_use]
    pub fn as_capture(&self) -> Option<&str> {
        match self {
            Self::Capture(name) => Some(name),
            Self::Literal(_) => None,
        }
    }

    /// Returns the literal text when the argument is a literal.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Capture(_) => None,
        }
    }
}

/// A predicate or directive attached to a query pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveCall {
    name: String,
    args: Vec<DirectiveArg>,
}

impl DirectiveCall {
    /// Creates a call of directive `name` (including its `!` or `?` suffix).
    #[must_use]
    pub fn new(name: impl Into<String>, args: Vec<DirectiveArg>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Returns the directive name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the call arguments.
    #[must_use]
    pub fn args(&self) -> &[DirectiveArg] {
        &self.args
    }

    /// Returns whether the call is a filtering predicate (`?` suffix).
    #[must_use]
    pub fn is_predicate(&self) -> bool {
        self.name.ends_with('?')
    }
}

/// All captures of one query match together with the pattern's directives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSet {
    pattern_index: usize,
    captures: Vec<Capture>,
    directives: Vec<DirectiveCall>,
}

impl CaptureSet {
    /// Creates an empty capture set for the given pattern.
    #[must_use]
    pub fn new(pattern_index: usize) -> Self {
        Self {
            pattern_index,
            ..Self::default()
        }
    }

    /// Adds a capture.
    #[must_use]
    pub fn with_capture(mut self, capture: Capture) -> Self {
        self.captures.push(capture);
        self
    }

    /// Adds a directive call.
    #[must_use]
    pub fn with_directive(mut self, call: DirectiveCall) -> Self {
        self.directives.push(call);
        self
    }

    /// Returns the index of the query pattern that matched.
    #[must_use]
    pub const fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    /// Returns all captures in match order.
    #[must_use]
    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }

    /// Returns the directive calls attached to the matching pattern.
    #[must_use]
    pub fn directives(&self) -> &[DirectiveCall] {
        &self.directives
    }

    /// Returns the first capture with the given name.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&Capture> {
        self.captures.iter().find(|capture| capture.name == name)
    }
}
