//! Registry of query predicates and directives.
//!
//! Injection queries annotate patterns with calls such as
//! `(#offset! @injection.content 0 1 0 -1)`. The [`DirectiveRegistry`] maps
//! each call name to a [`DirectiveSpec`]: the argument kinds it accepts and
//! the handler that applies it to a [`RegionDraft`]. Calls are validated
//! against their spec when a query is compiled, so a malformed query fails
//! before any document is formatted.
//!
//! Predicates (names ending in `?`) filter matches; directives (names ending
//! in `!`) annotate the region being built.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use regex::Regex;

use crate::capture::{CaptureSet, DirectiveArg, DirectiveCall, CONTENT_CAPTURE, LANGUAGE_CAPTURE};
use crate::error::InjectionError;

/// Kind of value a directive argument must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// A capture reference.
    Capture,
    /// A signed integer literal.
    Integer,
    /// A literal holding exactly one character.
    Character,
    /// Any literal.
    Text,
    /// A literal that compiles as a regular expression.
    Regex,
}

impl ArgKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::Capture => "must be a capture",
            Self::Integer => "must be an integer",
            Self::Character => "must be a single character",
            Self::Text => "must be a literal",
            Self::Regex => "must be a valid regular expression",
        }
    }
}

/// Signed row and column deltas applied to a capture by `#offset!`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OffsetAdjustment {
    /// Row delta for the start position.
    pub start_row: i64,
    /// Column delta for the start position.
    pub start_column: i64,
    /// Row delta for the end position.
    pub end_row: i64,
    /// Column delta for the end position.
    pub end_column: i64,
}

/// Region attributes accumulated while directives run over one match.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionDraft {
    /// Language label assigned by `#set! injection.language`.
    pub language: Option<String>,
    /// Escape-sensitive character registered by `#escape!`.
    pub escape: Option<char>,
    /// Range adjustment registered by `#offset!`.
    pub offset: Option<OffsetAdjustment>,
}

/// Whether a match survives a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOutcome {
    /// Keep the match.
    Keep,
    /// Drop the match; it never becomes a region.
    Discard,
}

/// Inputs available to a directive handler.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveContext<'a> {
    /// The match being interpreted.
    pub captures: &'a CaptureSet,
    /// The text the match was found in.
    pub source: &'a str,
    /// Registry the handler belongs to.
    pub registry: &'a DirectiveRegistry,
}

/// Handler applying a validated call to a region draft.
pub type DirectiveHandler = fn(
    &DirectiveCall,
    &DirectiveContext<'_>,
    &mut RegionDraft,
) -> Result<DirectiveOutcome, InjectionError>;

/// Argument contract and handler of one directive.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveSpec {
    name: &'static str,
    required: &'static [ArgKind],
    optional: &'static [ArgKind],
    handler: DirectiveHandler,
}

impl DirectiveSpec {
    /// Creates a spec. `name` includes the `!` or `?` suffix.
    #[must_use]
    pub const fn new(
        name: &'static str,
        required: &'static [ArgKind],
        optional: &'static [ArgKind],
        handler: DirectiveHandler,
    ) -> Self {
        Self {
            name,
            required,
            optional,
            handler,
        }
    }

    /// Returns the directive name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn expected_arity(&self) -> String {
        let min = self.required.len();
        let max = min.saturating_add(self.optional.len());
        if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        }
    }

    fn kind_at(&self, index: usize) -> Option<ArgKind> {
        self.required
            .get(index)
            .or_else(|| self.optional.get(index.saturating_sub(self.required.len())))
            .copied()
    }
}

/// Name-indexed collection of directive specs.
#[derive(Debug, Default)]
pub struct DirectiveRegistry {
    specs: HashMap<&'static str, DirectiveSpec>,
    regexes: Mutex<HashMap<String, Regex>>,
}

impl DirectiveRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding `#offset!`, `#escape!`, `#set!` and
    /// `#match?`.
    #[must_use]
    pub fn standard() -> Self {
        let mut specs = HashMap::new();
        for spec in STANDARD_DIRECTIVES {
            specs.insert(spec.name, *spec);
        }
        Self {
            specs,
            regexes: Mutex::default(),
        }
    }

    /// Registers an additional directive.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::DuplicateDirective`] when the name is taken.
    pub fn register(&mut self, spec: DirectiveSpec) -> Result<(), InjectionError> {
        if self.specs.contains_key(spec.name) {
            return Err(InjectionError::DuplicateDirective {
                name: spec.name.to_owned(),
            });
        }
        self.specs.insert(spec.name, spec);
        Ok(())
    }

    /// Looks up a directive by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DirectiveSpec> {
        self.specs.get(name)
    }

    /// Checks a call against its registered argument contract.
    ///
    /// # Errors
    ///
    /// Returns an error naming `query` when the directive is unknown, the
    /// argument count is wrong, or an argument has the wrong kind.
    pub fn validate(&self, query: &str, call: &DirectiveCall) -> Result<(), InjectionError> {
        let spec = self
            .get(call.name())
            .ok_or_else(|| InjectionError::unknown_directive(query, call.name()))?;

        let found = call.args().len();
        let max = spec.required.len().saturating_add(spec.optional.len());
        if found < spec.required.len() || found > max {
            return Err(InjectionError::DirectiveArity {
                query: query.to_owned(),
                directive: call.name().to_owned(),
                expected: spec.expected_arity(),
                found,
            });
        }

        for (index, arg) in call.args().iter().enumerate() {
            let Some(kind) = spec.kind_at(index) else {
                continue;
            };
            if !self.accepts(kind, arg) {
                return Err(InjectionError::DirectiveArgument {
                    query: query.to_owned(),
                    directive: call.name().to_owned(),
                    position: index.saturating_add(1),
                    message: kind.describe().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Applies a call to `draft`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::UnknownDirective`] when the call was never
    /// registered, or whatever the handler reports.
    pub fn apply(
        &self,
        query: &str,
        call: &DirectiveCall,
        context: &DirectiveContext<'_>,
        draft: &mut RegionDraft,
    ) -> Result<DirectiveOutcome, InjectionError> {
        let spec = self
            .get(call.name())
            .ok_or_else(|| InjectionError::unknown_directive(query, call.name()))?;
        (spec.handler)(call, context, draft).map_err(|error| error.in_query(query))
    }

    /// Returns a compiled regular expression, caching it by pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex compile error for invalid patterns.
    pub fn regex(&self, pattern: &str) -> Result<Regex, regex::Error> {
        let mut cache = self.regexes.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(regex) = cache.get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern)?;
        cache.insert(pattern.to_owned(), regex.clone());
        Ok(regex)
    }

    fn accepts(&self, kind: ArgKind, arg: &DirectiveArg) -> bool {
        match (kind, arg) {
            (ArgKind::Capture, DirectiveArg::Capture(_))
            | (ArgKind::Text, DirectiveArg::Literal(_)) => true,
            (ArgKind::Integer, DirectiveArg::Literal(text)) => text.parse::<i64>().is_ok(),
            (ArgKind::Character, DirectiveArg::Literal(text)) => single_char(text).is_some(),
            (ArgKind::Regex, DirectiveArg::Literal(text)) => self.regex(text).is_ok(),
            _ => false,
        }
    }
}

const STANDARD_DIRECTIVES: &[DirectiveSpec] = &[
    DirectiveSpec::new(
        "offset!",
        &[
            ArgKind::Capture,
            ArgKind::Integer,
            ArgKind::Integer,
            ArgKind::Integer,
            ArgKind::Integer,
        ],
        &[],
        apply_offset,
    ),
    DirectiveSpec::new(
        "escape!",
        &[ArgKind::Capture, ArgKind::Character],
        &[],
        apply_escape,
    ),
    DirectiveSpec::new("set!", &[ArgKind::Text], &[ArgKind::Text], apply_set),
    DirectiveSpec::new(
        "match?",
        &[ArgKind::Capture, ArgKind::Regex],
        &[],
        apply_match,
    ),
];

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

fn argument_error(call: &DirectiveCall, position: usize, message: &str) -> InjectionError {
    InjectionError::DirectiveArgument {
        query: String::new(),
        directive: call.name().to_owned(),
        position,
        message: message.to_owned(),
    }
}

fn capture_arg(call: &DirectiveCall) -> Result<&str, InjectionError> {
    call.args()
        .first()
        .and_then(DirectiveArg::as_capture)
        .ok_or_else(|| argument_error(call, 1, ArgKind::Capture.describe()))
}

fn literal_arg(call: &DirectiveCall, index: usize) -> Result<&str, InjectionError> {
    call.args()
        .get(index)
        .and_then(DirectiveArg::as_literal)
        .ok_or_else(|| argument_error(call, index.saturating_add(1), ArgKind::Text.describe()))
}

fn integer_arg(call: &DirectiveCall, index: usize) -> Result<i64, InjectionError> {
    literal_arg(call, index)?
        .parse()
        .map_err(|_| argument_error(call, index.saturating_add(1), ArgKind::Integer.describe()))
}

fn apply_offset(
    call: &DirectiveCall,
    _context: &DirectiveContext<'_>,
    draft: &mut RegionDraft,
) -> Result<DirectiveOutcome, InjectionError> {
    if capture_arg(call)? != CONTENT_CAPTURE {
        return Ok(DirectiveOutcome::Keep);
    }
    draft.offset = Some(OffsetAdjustment {
        start_row: integer_arg(call, 1)?,
        start_column: integer_arg(call, 2)?,
        end_row: integer_arg(call, 3)?,
        end_column: integer_arg(call, 4)?,
    });
    Ok(DirectiveOutcome::Keep)
}

fn apply_escape(
    call: &DirectiveCall,
    _context: &DirectiveContext<'_>,
    draft: &mut RegionDraft,
) -> Result<DirectiveOutcome, InjectionError> {
    if capture_arg(call)? != CONTENT_CAPTURE {
        return Ok(DirectiveOutcome::Keep);
    }
    let escape = single_char(literal_arg(call, 1)?)
        .ok_or_else(|| argument_error(call, 2, ArgKind::Character.describe()))?;
    draft.escape = Some(escape);
    Ok(DirectiveOutcome::Keep)
}

fn apply_set(
    call: &DirectiveCall,
    _context: &DirectiveContext<'_>,
    draft: &mut RegionDraft,
) -> Result<DirectiveOutcome, InjectionError> {
    // Other keys (`injection.combined`, `priority`, ...) only matter to
    // highlighters.
    if literal_arg(call, 0)? == LANGUAGE_CAPTURE {
        draft.language = call
            .args()
            .get(1)
            .and_then(DirectiveArg::as_literal)
            .map(str::to_owned);
    }
    Ok(DirectiveOutcome::Keep)
}

fn apply_match(
    call: &DirectiveCall,
    context: &DirectiveContext<'_>,
    _draft: &mut RegionDraft,
) -> Result<DirectiveOutcome, InjectionError> {
    let Some(capture) = context.captures.capture(capture_arg(call)?) else {
        return Ok(DirectiveOutcome::Discard);
    };
    let pattern = literal_arg(call, 1)?;
    let regex = context
        .registry
        .regex(pattern)
        .map_err(|e| argument_error(call, 2, &e.to_string()))?;
    Ok(if regex.is_match(capture.text(context.source)) {
        DirectiveOutcome::Keep
    } else {
        DirectiveOutcome::Discard
    })
}
