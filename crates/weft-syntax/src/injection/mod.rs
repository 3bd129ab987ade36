//! Compiled injection queries.
//!
//! An [`InjectionQuery`] wraps a Tree-sitter query for one host grammar.
//! Tree-sitter evaluates the text predicates it knows (`#match?`, `#eq?`,
//! `#any-of?`) itself and hands everything else back uninterpreted: `#set!`
//! as property settings and custom calls such as `#offset!` as general
//! predicates. Both are converted to [`DirectiveCall`]s and validated against
//! a [`DirectiveRegistry`] when the query is compiled.

use tree_sitter::{QueryCursor, QueryPredicateArg, StreamingIterator};

use crate::capture::{Capture, CaptureSet, DirectiveArg, DirectiveCall};
use crate::directive::DirectiveRegistry;
use crate::error::InjectionError;
use crate::interpret::{interpret, Interpretation};
use crate::language::SupportedLanguage;
use crate::parser::ParseResult;

/// A validated injection query for one host grammar.
pub struct InjectionQuery {
    name: String,
    language: SupportedLanguage,
    query: tree_sitter::Query,
    directives: Vec<Vec<DirectiveCall>>,
}

impl std::fmt::Debug for InjectionQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionQuery")
            .field("name", &self.name)
            .field("language", &self.language)
            .field("patterns", &self.query.pattern_count())
            .finish_non_exhaustive()
    }
}

impl InjectionQuery {
    /// Compiles `source` for `language` and validates its directives.
    ///
    /// `name` identifies the query in diagnostics, typically its path.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::QueryCompile`] when Tree-sitter rejects the
    /// query, or a directive error when a call is unknown or malformed.
    pub fn compile(
        language: SupportedLanguage,
        name: impl Into<String>,
        source: &str,
        registry: &DirectiveRegistry,
    ) -> Result<Self, InjectionError> {
        let name = name.into();
        let query = tree_sitter::Query::new(&language.tree_sitter_language(), source)
            .map_err(|e| InjectionError::query_compile(&name, e.to_string()))?;

        let mut directives = Vec::with_capacity(query.pattern_count());
        for pattern in 0..query.pattern_count() {
            let calls = pattern_calls(&query, pattern);
            for call in &calls {
                registry.validate(&name, call)?;
            }
            directives.push(calls);
        }

        Ok(Self {
            name,
            language,
            query,
            directives,
        })
    }

    /// Returns the query name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the host grammar the query was compiled for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Runs the query over a parse result and returns one capture set per
    /// match, in Tree-sitter's match order.
    #[must_use]
    pub fn captures(&self, parsed: &ParseResult) -> Vec<CaptureSet> {
        let names = self.query.capture_names();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.query, parsed.root_node(), parsed.source().as_bytes());

        let mut sets = Vec::new();
        while let Some(found) = matches.next() {
            let mut set = CaptureSet::new(found.pattern_index);
            for captured in found.captures {
                let name = usize::try_from(captured.index)
                    .ok()
                    .and_then(|index| names.get(index))
                    .copied()
                    .unwrap_or_default();
                set = set.with_capture(Capture::new(
                    name,
                    captured.node.byte_range(),
                    captured.node.start_position().into(),
                    captured.node.end_position().into(),
                ));
            }
            for call in self.directives.get(found.pattern_index).into_iter().flatten() {
                set = set.with_directive(call.clone());
            }
            sets.push(set);
        }
        sets
    }

    /// Runs the query and interprets its matches.
    ///
    /// # Errors
    ///
    /// Propagates directive handler errors from [`interpret`].
    pub fn find(
        &self,
        parsed: &ParseResult,
        registry: &DirectiveRegistry,
    ) -> Result<Interpretation, InjectionError> {
        interpret(&self.name, &self.captures(parsed), parsed.source(), registry)
    }
}

fn pattern_calls(query: &tree_sitter::Query, pattern: usize) -> Vec<DirectiveCall> {
    let names = query.capture_names();
    let settings = query.property_settings(pattern).iter().map(|setting| {
        let mut args = vec![DirectiveArg::Literal(setting.key.to_string())];
        args.extend(
            setting
                .value
                .as_ref()
                .map(|value| DirectiveArg::Literal(value.to_string())),
        );
        DirectiveCall::new("set!", args)
    });
    let predicates = query.general_predicates(pattern).iter().map(|predicate| {
        let args = predicate
            .args
            .iter()
            .map(|arg| match arg {
                QueryPredicateArg::Capture(id) => DirectiveArg::Capture(
                    usize::try_from(*id)
                        .ok()
                        .and_then(|index| names.get(index))
                        .map(|name| (*name).to_owned())
                        .unwrap_or_default(),
                ),
                QueryPredicateArg::String(text) => DirectiveArg::Literal(text.to_string()),
            })
            .collect();
        DirectiveCall::new(predicate.operator.to_string(), args)
    });
    settings.chain(predicates).collect()
}
