//! Shared test doubles and crate-level BDD tests.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use weft_formatters::{FormatError, FormatOptions, FormatterDispatch};
use weft_syntax::{InjectionError, InjectionSource, InjectionSpan, Interpretation};


/// Builds an injection span without offset metadata.
pub(crate) fn span(
    range: std::ops::Range<usize>,
    language: &str,
    escape: Option<char>,
) -> InjectionSpan {
    InjectionSpan {
        raw_range: range.clone(),
        range,
        language: language.to_owned(),
        escape,
        offset: None,
        pattern_index: 0,
    }
}

/// Delimiter rule: text between `open` and `close` is a `language` region.
#[derive(Debug, Clone)]
struct Rule {
    open: char,
    close: char,
    language: String,
    escape: Option<char>,
}

/// Injection source driven by delimiter rules per host language.
///
/// A backslash skips the following character while searching for the
/// closing delimiter, so escaped delimiters stay inside the region.
#[derive(Debug, Default)]
pub(crate) struct DelimitedSource {
    rules: HashMap<String, Vec<Rule>>,
}

impl DelimitedSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks text between `open` and `close` in `host` as `language`.
    pub(crate) fn rule(
        mut self,
        host: &str,
        open: char,
        close: char,
        language: &str,
        escape: Option<char>,
    ) -> Self {
        self.rules.entry(host.to_owned()).or_default().push(Rule {
            open,
            close,
            language: language.to_owned(),
            escape,
        });
        self
    }
}

impl InjectionSource for DelimitedSource {
    fn find(&self, language: &str, text: &str) -> Result<Option<Interpretation>, InjectionError> {
        let Some(rules) = self.rules.get(language) else {
            return Ok(None);
        };
        let mut spans = Vec::new();
        for rule in rules {
            let mut chars = text.char_indices();
            while let Some((at, ch)) = chars.next() {
                if ch != rule.open {
                    continue;
                }
                let start = at + ch.len_utf8();
                let mut end = None;
                while let Some((inner_at, inner)) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == rule.close {
                        end = Some(inner_at);
                        break;
                    }
                }
                if let Some(stop) = end {
                    spans.push(span(start..stop, &rule.language, rule.escape));
                }
            }
        }
        Ok(Some(Interpretation {
            spans,
            faults: Vec::new(),
        }))
    }
}

/// Formatter dispatch with built-in behaviours keyed by formatter id.
///
/// | id | behaviour |
/// |----|-----------|
/// | `upper` | upper-cases ASCII |
/// | `trim` | trims surrounding whitespace |
/// | `wrap` | surrounds the text with parentheses |
/// | `width` | appends `@<width>` |
/// | `fail` | fails with exit code 1 |
/// | `binary` | returns invalid UTF-8 |
/// | `missing_plugin` | fails to load its plugin |
#[derive(Debug, Default)]
pub(crate) struct ScriptedDispatch {
    chains: HashMap<String, Vec<String>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedDispatch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Configures the formatter chain of `language`.
    pub(crate) fn chain(mut self, language: &str, formatters: &[&str]) -> Self {
        self.chains.insert(
            language.to_owned(),
            formatters.iter().map(|id| (*id).to_owned()).collect(),
        );
        self
    }

    /// Returns every `(formatter, input)` pair seen so far.
    pub(crate) fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FormatterDispatch for ScriptedDispatch {
    fn formatters_for(&self, language: &str) -> &[String] {
        self.chains.get(language).map(Vec::as_slice).unwrap_or_default()
    }

    fn invoke(
        &self,
        formatter: &str,
        input: &[u8],
        options: &FormatOptions,
    ) -> Result<Vec<u8>, FormatError> {
        let text = String::from_utf8_lossy(input).into_owned();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((formatter.to_owned(), text.clone()));
        match formatter {
            "upper" => Ok(text.to_ascii_uppercase().into_bytes()),
            "trim" => Ok(text.trim().as_bytes().to_vec()),
            "wrap" => Ok(format!("({text})").into_bytes()),
            "width" => Ok(format!("{text}@{}", options.width).into_bytes()),
            "fail" => Err(FormatError::ExternalToolFailed {
                cmd: String::from("fail"),
                exit_code: Some(1),
                diagnostics: String::from("syntax error"),
            }),
            "binary" => Ok(vec![0xff, 0xfe]),
            "missing_plugin" => Err(FormatError::PluginLoad {
                plugin_id: String::from("file:///missing.wasm"),
                message: String::from("not found"),
            }),
            other => Err(FormatError::UnknownFormatter {
                id: other.to_owned(),
            }),
        }
    }
}
