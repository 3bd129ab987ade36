//! Region discovery, the first phase of a run.
//!
//! Discovery walks the document top-down. For each text it asks the
//! [`InjectionSource`] for spans, nests them with the candidates inherited
//! from the enclosing parse, extracts and unescapes every top-level region
//! and recurses into the extracted text. Regions are stored bottom-up in a
//! [`RegionArena`].
//!
//! Nothing is formatted here. Every configuration and extraction problem is
//! collected so the run can report them together before any formatter
//! starts.

use std::collections::HashSet;

use tracing::debug;
use weft_formatters::FormatterDispatch;
use weft_syntax::InjectionSource;

use crate::error::{ConfigurationError, ExtractionError, FormatRunError, RegionContext};
use crate::escape;
use crate::policy::EnginePolicy;
use crate::region::{Region, RegionArena, RegionId, RegionTree};
use crate::tree::{self, Candidate, Nested};

const DISCOVER_TARGET: &str = "weft_engine::discover";

/// Builds the region tree of `source`, written in `language`.
///
/// # Errors
///
/// Returns [`FormatRunError::Configuration`] when queries, region layout or
/// policy are invalid, otherwise [`FormatRunError::Extraction`] when region
/// text cannot be extracted.
pub(crate) fn discover(
    injections: &dyn InjectionSource,
    formatters: &dyn FormatterDispatch,
    policy: &EnginePolicy,
    language: &str,
    source: &str,
) -> Result<RegionTree, FormatRunError> {
    let mut discovery = Discovery {
        injections,
        formatters,
        policy,
        arena: RegionArena::default(),
        failed_queries: HashSet::new(),
        configuration: Vec::new(),
        extraction: Vec::new(),
    };

    let children = discovery.discover_text(source, language, 0, Vec::new());
    let root = discovery.arena.push(Region {
        range: 0..source.len(),
        language: language.to_owned(),
        escape: None,
        depth: None,
        local: source.to_owned(),
        children,
    });

    if !discovery.configuration.is_empty() {
        return Err(FormatRunError::Configuration(discovery.configuration));
    }
    if !discovery.extraction.is_empty() {
        return Err(FormatRunError::Extraction(discovery.extraction));
    }
    Ok(discovery.arena.finish(root))
}

struct Discovery<'a> {
    injections: &'a dyn InjectionSource,
    formatters: &'a dyn FormatterDispatch,
    policy: &'a EnginePolicy,
    arena: RegionArena,
    failed_queries: HashSet<String>,
    configuration: Vec<ConfigurationError>,
    extraction: Vec<ExtractionError>,
}

impl Discovery<'_> {
    /// Discovers the regions of `text`, which are placed at `depth`,
    /// returning their ids in source order.
    fn discover_text(
        &mut self,
        text: &str,
        language: &str,
        depth: usize,
        inherited: Vec<Candidate>,
    ) -> Vec<RegionId> {
        let mut candidates = inherited;
        match self.injections.find(language, text) {
            Ok(Some(found)) => {
                self.extraction.extend(
                    found
                        .faults
                        .into_iter()
                        .map(|fault| ExtractionError::Offset { depth, fault }),
                );
                candidates.extend(found.spans.into_iter().map(Candidate::from));
            }
            Ok(None) => {}
            Err(source) => {
                if self.failed_queries.insert(language.to_owned()) {
                    self.configuration.push(ConfigurationError::Query {
                        language: language.to_owned(),
                        source,
                    });
                }
            }
        }

        match tree::nest(candidates, depth) {
            Ok(level) => level
                .into_iter()
                .filter_map(|nested| self.region(text, depth, nested))
                .collect(),
            Err(err) => {
                self.configuration.push(err);
                Vec::new()
            }
        }
    }

    /// Extracts one top-level region of `text` and everything inside it.
    fn region(&mut self, text: &str, depth: usize, nested: Nested) -> Option<RegionId> {
        let Nested { candidate, inner } = nested;
        if depth >= self.policy.max_depth {
            self.configuration.push(ConfigurationError::NestingTooDeep {
                region: context(&candidate, depth),
                max_depth: self.policy.max_depth,
            });
            return None;
        }
        if self.policy.strict && self.formatters.formatters_for(&candidate.language).is_empty() {
            self.configuration
                .push(ConfigurationError::UnformattedLanguage {
                    region: context(&candidate, depth),
                });
        }

        let Some(raw) = text.get(candidate.range.clone()) else {
            self.extraction.push(ExtractionError::InvalidRange {
                region: context(&candidate, depth),
            });
            return None;
        };
        let plain = escape::unescape(raw, candidate.escape);

        let start = candidate.range.start;
        let mut relocated = Vec::with_capacity(inner.len());
        for mut child in inner {
            let relative = child.range.start - start..child.range.end - start;
            if let Some(range) = plain.map_range(&relative) {
                child.range = range;
                relocated.push(child);
            } else if let Some(escape) = candidate.escape {
                self.extraction.push(ExtractionError::SplitEscape {
                    region: context(&child, depth + 1),
                    escape,
                });
            }
        }

        debug!(
            target: DISCOVER_TARGET,
            language = %candidate.language,
            depth,
            start = candidate.range.start,
            end = candidate.range.end,
            "discovered region"
        );

        let local = plain.into_text();
        let children = self.discover_text(&local, &candidate.language, depth + 1, relocated);
        Some(self.arena.push(Region {
            range: candidate.range,
            language: candidate.language,
            escape: candidate.escape,
            depth: Some(depth),
            local,
            children,
        }))
    }
}

fn context(candidate: &Candidate, depth: usize) -> RegionContext {
    RegionContext::new(candidate.range.clone(), depth, candidate.language.clone())
}
