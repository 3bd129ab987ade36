//! Tree-sitter powered injection discovery for the weft formatter.
//!
//! This crate finds regions of embedded language inside parsed source text:
//!
//! - **Parsing** via [`Parser`] for the bundled host grammars
//! - **Query matching** via [`InjectionQuery`], which turns Tree-sitter
//!   matches into grammar-independent [`CaptureSet`]s
//! - **Directive interpretation** via [`DirectiveRegistry`] and
//!   [`interpret`], which apply `#offset!`, `#escape!`, `#set!` and
//!   `#match?` to produce [`InjectionSpan`]s
//! - **Query lookup** via [`InjectionCatalog`], the [`InjectionSource`] used
//!   by the formatting engine
//!
//! # Supported Languages
//!
//! Host grammars are bundled for:
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//!
//! Injected languages are free-form labels. A label without a bundled
//! grammar (`sql`, `json`, ...) is still a valid region; it simply cannot
//! contain further injections.
//!
//! # Directives
//!
//! | Call | Effect |
//! |------|--------|
//! | `#offset! @cap r0 c0 r1 c1` | shifts the capture's start and end points by row/column deltas |
//! | `#escape! @cap "c"` | marks `c` as escaped in the host text (`\c`) |
//! | `#set! injection.language "l"` | labels the region |
//! | `#match? @cap "re"` | keeps the match only if the capture text matches |
//!
//! Unknown directives and calls with the wrong arguments are rejected when a
//! query is compiled.
//!
//! # Example
//!
//! ```
//! use weft_syntax::{InjectionCatalog, InjectionSource};
//!
//! let catalog = InjectionCatalog::new(Vec::new());
//! let source = "fn main() { let q = \"SELECT 1 FROM t\"; }";
//! let found = catalog.find("rust", source)?.unwrap_or_default();
//! assert_eq!(found.spans[0].language, "sql");
//! # Ok::<(), weft_syntax::InjectionError>(())
//! ```

mod capture;
mod catalog;
mod directive;
mod error;
mod injection;
mod interpret;
mod language;
mod parser;
mod position;

pub use capture::{
    CONTENT_CAPTURE, Capture, CaptureSet, DirectiveArg, DirectiveCall, LANGUAGE_CAPTURE,
};
pub use catalog::{INJECTIONS_FILE, InjectionCatalog, InjectionSource, query_path};
pub use directive::{
    ArgKind, DirectiveContext, DirectiveHandler, DirectiveOutcome, DirectiveRegistry,
    DirectiveSpec, OffsetAdjustment, RegionDraft,
};
pub use error::{InjectionError, SyntaxError};
pub use injection::InjectionQuery;
pub use interpret::{ExtractionFault, FaultReason, InjectionSpan, Interpretation, interpret};
pub use language::{LanguageParseError, SupportedLanguage};
pub use parser::{ParseResult, Parser, SyntaxErrorInfo};
pub use position::{LineIndex, TextPoint};
