//! Unit tests for the formatter registry.

use rstest::{fixture, rstest};

use super::*;
use crate::backend::{CommandSpec, FormatterBackend, PluginReference};

fn command(id: &str) -> FormatterDefinition {
    FormatterDefinition::new(
        id,
        FormatterBackend::ExternalCommand(CommandSpec::new(id, vec!["-".into()])),
    )
}

#[fixture]
fn populated_registry() -> FormatterRegistry {
    let mut r = FormatterRegistry::new();
    r.register(command("pg_format")).expect("register pg_format");
    r.register(command("sqlfluff")).expect("register sqlfluff");
    r.register(FormatterDefinition::new(
        "jsonfmt",
        FormatterBackend::WasmPlugin(PluginReference::new("file:///json.wasm")),
    ))
    .expect("register jsonfmt");
    r
}

#[rstest]
fn register_rejects_duplicates(mut populated_registry: FormatterRegistry) {
    let err = populated_registry
        .register(command("pg_format"))
        .expect_err("duplicate");
    assert!(matches!(err, FormatError::Registry { .. }));
    assert_eq!(populated_registry.len(), 3);
}

#[rstest]
fn assign_preserves_chain_order(mut populated_registry: FormatterRegistry) {
    populated_registry
        .assign("sql", vec!["sqlfluff".into(), "pg_format".into()])
        .expect("valid chain");
    assert_eq!(
        populated_registry.formatters_for("sql"),
        ["sqlfluff", "pg_format"]
    );
}

#[rstest]
fn assign_rejects_unknown_formatters(mut populated_registry: FormatterRegistry) {
    let err = populated_registry
        .assign("sql", vec!["pg_format".into(), "missing".into()])
        .expect_err("unknown formatter");
    assert!(matches!(err, FormatError::UnknownFormatter { ref id } if id == "missing"));
    assert!(populated_registry.formatters_for("sql").is_empty());
}

#[rstest]
#[case("SQL")]
#[case(" sql ")]
fn language_lookup_is_case_insensitive(
    mut populated_registry: FormatterRegistry,
    #[case] lookup: &str,
) {
    populated_registry
        .assign("sql", vec!["pg_format".into()])
        .expect("valid chain");
    assert!(populated_registry.is_formatted(lookup));
}

#[rstest]
fn unconfigured_languages_have_empty_chains(populated_registry: FormatterRegistry) {
    assert!(populated_registry.formatters_for("markdown").is_empty());
    assert!(!populated_registry.is_formatted("markdown"));
}

#[rstest]
fn empty_chain_marks_language_unformatted(mut populated_registry: FormatterRegistry) {
    populated_registry.assign("json", Vec::new()).expect("empty chain");
    assert_eq!(populated_registry.languages(), ["json"]);
    assert!(!populated_registry.is_formatted("json"));
}

#[test]
fn register_rejects_invalid_definitions() {
    let mut registry = FormatterRegistry::new();
    let err = registry.register(command("")).expect_err("blank id");
    assert!(matches!(err, FormatError::Registry { .. }));
    assert!(registry.is_empty());
}
