//! Error types for parsing and injection discovery.
//!
//! [`SyntaxError`] covers grammar initialisation and parsing. [`InjectionError`]
//! covers everything that makes an injection query unusable: compilation
//! failures, unknown directives and directive calls with the wrong shape.
//! Every injection error is a configuration problem and names the offending
//! query so operators can find it.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::language::SupportedLanguage;

/// Errors from parsing operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// Failed to initialise the Tree-sitter parser for a language.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInitError {
        /// The language that failed to initialise.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// Failed to parse source code.
    #[error("failed to parse {language}: {message}")]
    ParseError {
        /// The language that failed to parse.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },
}

impl SyntaxError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParserInitError {
            language,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParseError {
            language,
            message: message.into(),
        }
    }
}

/// Errors that make an injection query unusable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InjectionError {
    /// The query source could not be compiled by Tree-sitter.
    #[error("injection query '{query}' failed to compile: {message}")]
    QueryCompile {
        /// Name of the query (usually its path).
        query: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// The query uses a directive that is not registered.
    #[error("injection query '{query}' uses unknown directive '#{directive}'")]
    UnknownDirective {
        /// Name of the query.
        query: String,
        /// Directive name including its `!` or `?` suffix.
        directive: String,
    },

    /// A directive was called with the wrong number of arguments.
    #[error(
        "injection query '{query}': '#{directive}' expects {expected} argument(s), found {found}"
    )]
    DirectiveArity {
        /// Name of the query.
        query: String,
        /// Directive name.
        directive: String,
        /// Human-readable description of the accepted arity.
        expected: String,
        /// Number of arguments supplied.
        found: usize,
    },

    /// A directive argument has the wrong type or value.
    #[error("injection query '{query}': argument {position} of '#{directive}' {message}")]
    DirectiveArgument {
        /// Name of the query.
        query: String,
        /// Directive name.
        directive: String,
        /// One-based argument position.
        position: usize,
        /// Description of the problem.
        message: String,
    },

    /// A directive name was registered twice.
    #[error("directive '#{name}' is already registered")]
    DuplicateDirective {
        /// Directive name.
        name: String,
    },

    /// A query file could not be read.
    #[error("failed to read injection query {}: {source}", path.display())]
    QueryRead {
        /// Path of the query file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Parsing the text to search for injections failed.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl InjectionError {
    /// Creates a query compilation error.
    #[must_use]
    pub fn query_compile(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryCompile {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Creates an unknown directive error.
    #[must_use]
    pub fn unknown_directive(query: impl Into<String>, directive: impl Into<String>) -> Self {
        Self::UnknownDirective {
            query: query.into(),
            directive: directive.into(),
        }
    }

    /// Attaches the query name to errors raised without one.
    pub(crate) fn in_query(mut self, name: &str) -> Self {
        match &mut self {
            Self::QueryCompile { query, .. }
            | Self::UnknownDirective { query, .. }
            | Self::DirectiveArity { query, .. }
            | Self::DirectiveArgument { query, .. }
                if query.is_empty() =>
            {
                name.clone_into(query);
            }
            _ => {}
        }
        self
    }

    /// Returns the name of the query this error refers to, when there is one.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        match self {
            Self::QueryCompile { query, .. }
            | Self::UnknownDirective { query, .. }
            | Self::DirectiveArity { query, .. }
            | Self::DirectiveArgument { query, .. } => Some(query),
            Self::DuplicateDirective { .. } | Self::QueryRead { .. } | Self::Syntax(_) => None,
        }
    }
}
