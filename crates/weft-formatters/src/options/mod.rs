//! Run-scoped formatting parameters.
//!
//! [`FormatOptions`] travels with every formatter invocation. Plugins receive
//! it as their options record; external commands see it through `$name`
//! placeholders in their argument templates.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Default line width handed to formatters.
pub const DEFAULT_TEXTWIDTH: usize = 80;

/// Placeholder bound to [`FormatOptions::width`].
pub const TEXTWIDTH_VARIABLE: &str = "textwidth";

#[expect(
    clippy::expect_used,
    reason = "the placeholder pattern is a literal that always compiles"
)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$|[A-Za-z_][A-Za-z0-9_]*)").expect("placeholder pattern compiles")
});

/// Parameters shared by all formatter invocations of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Preferred maximum line width.
    pub width: usize,
    /// Additional named values available as placeholders.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_TEXTWIDTH,
            variables: BTreeMap::new(),
        }
    }
}

impl FormatOptions {
    /// Creates options with the given width and no extra variables.
    #[must_use]
    pub const fn with_width(width: usize) -> Self {
        Self {
            width,
            variables: BTreeMap::new(),
        }
    }

    /// Adds a named variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Returns the value bound to placeholder `name`.
    ///
    /// `textwidth` always resolves to [`FormatOptions::width`]; other names
    /// resolve through [`FormatOptions::variables`].
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        if name == TEXTWIDTH_VARIABLE {
            return Some(self.width.to_string());
        }
        self.variables.get(name).cloned()
    }

    /// Expands `$name` placeholders in an argument template.
    ///
    /// `$$` produces a literal `$`. Placeholders with no bound value are
    /// left exactly as written.
    ///
    /// ```
    /// use weft_formatters::FormatOptions;
    ///
    /// let options = FormatOptions::with_width(100);
    /// assert_eq!(options.substitute("--width=$textwidth"), "--width=100");
    /// assert_eq!(options.substitute("$$HOME $unknown"), "$HOME $unknown");
    /// ```
    #[must_use]
    pub fn substitute(&self, template: &str) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                match caps.get(1).map(|m| m.as_str()) {
                    Some("$") => String::from("$"),
                    Some(name) => self.lookup(name).unwrap_or_else(|| whole.to_owned()),
                    None => whole.to_owned(),
                }
            })
            .into_owned()
    }

    /// Expands every template in `args`.
    #[must_use]
    pub fn substitute_all(&self, args: &[String]) -> Vec<String> {
        args.iter().map(|arg| self.substitute(arg)).collect()
    }
}
