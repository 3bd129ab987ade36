//! Formatter registry for definition storage and language lookup.
//!
//! The [`FormatterRegistry`] stores validated formatter definitions keyed by
//! identifier and, for each language, the ordered list of identifiers that
//! make up its formatter chain. Duplicate identifiers and chains naming an
//! unregistered formatter are rejected.

use std::collections::HashMap;

use crate::backend::FormatterDefinition;
use crate::error::FormatError;

/// Registry of formatter definitions and per-language chains.
///
/// # Example
///
/// ```
/// use weft_formatters::{CommandSpec, FormatterBackend, FormatterDefinition, FormatterRegistry};
///
/// let mut registry = FormatterRegistry::new();
/// registry
///     .register(FormatterDefinition::new(
///         "pg_format",
///         FormatterBackend::ExternalCommand(CommandSpec::new("pg_format", vec![])),
///     ))
///     .expect("registration succeeds");
/// registry
///     .assign("sql", vec!["pg_format".into()])
///     .expect("chain is valid");
/// assert_eq!(registry.formatters_for("SQL"), ["pg_format"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    formatters: HashMap<String, FormatterDefinition>,
    languages: HashMap<String, Vec<String>>,
}

impl FormatterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a formatter definition after validation.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Registry`] if validation fails or if a
    /// formatter with the same identifier is already registered.
    pub fn register(&mut self, definition: FormatterDefinition) -> Result<(), FormatError> {
        definition.validate()?;
        let id = definition.id().to_owned();
        if self.formatters.contains_key(&id) {
            return Err(FormatError::Registry {
                message: format!("formatter '{id}' is already registered"),
            });
        }
        self.formatters.insert(id, definition);
        Ok(())
    }

    /// Sets the formatter chain for `language`, replacing any previous one.
    ///
    /// Language names are case-insensitive. An empty chain is allowed and
    /// marks the language as explicitly unformatted.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnknownFormatter`] for the first identifier
    /// that is not registered.
    pub fn assign(&mut self, language: &str, chain: Vec<String>) -> Result<(), FormatError> {
        if let Some(unknown) = chain.iter().find(|id| !self.formatters.contains_key(*id)) {
            return Err(FormatError::UnknownFormatter {
                id: unknown.clone(),
            });
        }
        self.languages.insert(normalise(language), chain);
        Ok(())
    }

    /// Looks up a formatter by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FormatterDefinition> {
        self.formatters.get(id)
    }

    /// Returns the ordered formatter chain for `language`.
    ///
    /// Languages without a chain yield an empty slice.
    #[must_use]
    pub fn formatters_for(&self, language: &str) -> &[String] {
        self.languages
            .get(&normalise(language))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns whether `language` has at least one formatter.
    #[must_use]
    pub fn is_formatted(&self, language: &str) -> bool {
        !self.formatters_for(language).is_empty()
    }

    /// Returns the languages with a configured chain, sorted by name.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.languages.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered formatters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    /// Returns whether no formatter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }
}

fn normalise(language: &str) -> String {
    language.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests;
