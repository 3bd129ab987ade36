//! Grammar and query lookup by language label.
//!
//! The formatting engine asks an [`InjectionSource`] for the injections in a
//! piece of text. [`InjectionCatalog`] is the production implementation: it
//! maps a language label to a bundled grammar, finds `injections.scm` for
//! that grammar on its search paths (falling back to the queries shipped
//! with this crate) and caches every compiled query for the lifetime of the
//! catalog.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use crate::directive::DirectiveRegistry;
use crate::error::InjectionError;
use crate::injection::InjectionQuery;
use crate::interpret::Interpretation;
use crate::language::SupportedLanguage;
use crate::parser::Parser;

const CATALOG_TARGET: &str = "weft_syntax::catalog";

/// File name of injection queries inside a language directory.
pub const INJECTIONS_FILE: &str = "injections.scm";

const RUST_INJECTIONS: &str = include_str!("../queries/rust/injections.scm");
const PYTHON_INJECTIONS: &str = include_str!("../queries/python/injections.scm");

/// Source of injection spans for text of a given language.
pub trait InjectionSource: Send + Sync {
    /// Finds the injections in `text`, which is written in `language`.
    ///
    /// Returns `Ok(None)` when no grammar or no injection query exists for
    /// the language; such text cannot contain nested regions.
    ///
    /// # Errors
    ///
    /// Returns an [`InjectionError`] when the language's query is unusable.
    fn find(&self, language: &str, text: &str) -> Result<Option<Interpretation>, InjectionError>;
}

type QueryCache = HashMap<SupportedLanguage, Option<Arc<InjectionQuery>>>;

/// Query catalog backed by search paths and bundled defaults.
#[derive(Debug)]
pub struct InjectionCatalog {
    search_paths: Vec<PathBuf>,
    registry: DirectiveRegistry,
    queries: Mutex<QueryCache>,
}

impl InjectionCatalog {
    /// Creates a catalog searching `search_paths` in order, using the
    /// standard directive set.
    #[must_use]
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self::with_registry(search_paths, DirectiveRegistry::standard())
    }

    /// Creates a catalog with a custom directive registry.
    #[must_use]
    pub fn with_registry(search_paths: Vec<PathBuf>, registry: DirectiveRegistry) -> Self {
        Self {
            search_paths,
            registry,
            queries: Mutex::default(),
        }
    }

    /// Returns the directory search order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Returns the directive registry queries are validated against.
    #[must_use]
    pub const fn registry(&self) -> &DirectiveRegistry {
        &self.registry
    }

    /// Returns the compiled injection query for `language`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns an error when a query file cannot be read or compiled.
    pub fn query(
        &self,
        language: SupportedLanguage,
    ) -> Result<Option<Arc<InjectionQuery>>, InjectionError> {
        let mut cache = self.queries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.get(&language) {
            return Ok(cached.clone());
        }
        let loaded = self.load(language)?.map(Arc::new);
        cache.insert(language, loaded.clone());
        Ok(loaded)
    }

    /// Compiles the queries of every bundled grammar so configuration errors
    /// surface before any document is processed.
    ///
    /// # Errors
    ///
    /// Returns the first query error found.
    pub fn preload(&self) -> Result<(), InjectionError> {
        for language in SupportedLanguage::all() {
            self.query(*language)?;
        }
        Ok(())
    }

    fn load(&self, language: SupportedLanguage) -> Result<Option<InjectionQuery>, InjectionError> {
        if let Some(path) = self.locate(language) {
            let source = std::fs::read_to_string(&path).map_err(|e| InjectionError::QueryRead {
                path: path.clone(),
                source: Arc::new(e),
            })?;
            debug!(
                target: CATALOG_TARGET,
                language = %language,
                path = %path.display(),
                "loading injection query"
            );
            let name = path.display().to_string();
            return InjectionQuery::compile(language, name, &source, &self.registry).map(Some);
        }

        builtin_query(language)
            .map(|source| {
                let name = format!("builtin:{language}");
                InjectionQuery::compile(language, name, source, &self.registry)
            })
            .transpose()
    }

    fn locate(&self, language: SupportedLanguage) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|dir| query_path(dir, language))
            .find(|candidate| candidate.is_file())
    }
}

impl InjectionSource for InjectionCatalog {
    fn find(&self, language: &str, text: &str) -> Result<Option<Interpretation>, InjectionError> {
        let Some(grammar) = SupportedLanguage::from_label(language) else {
            return Ok(None);
        };
        let Some(query) = self.query(grammar)? else {
            return Ok(None);
        };

        let parsed = Parser::new(grammar)?.parse(text)?;
        if parsed.has_errors() {
            warn!(
                target: CATALOG_TARGET,
                language = %grammar,
                errors = parsed.errors().len(),
                "searching text with syntax errors for injections"
            );
        }
        query.find(&parsed, &self.registry).map(Some)
    }
}

/// Returns the path of `language`'s injection query under `dir`.
#[must_use]
pub fn query_path(dir: &Path, language: SupportedLanguage) -> PathBuf {
    dir.join(language.as_str()).join(INJECTIONS_FILE)
}

const fn builtin_query(language: SupportedLanguage) -> Option<&'static str> {
    match language {
        SupportedLanguage::Rust => Some(RUST_INJECTIONS),
        SupportedLanguage::Python => Some(PYTHON_INJECTIONS),
        SupportedLanguage::TypeScript => None,
    }
}
