//! End-to-end tests for the formatting engine.
//!
//! These tests wire the engine to the bundled injection queries and to real
//! formatter runners, the way the command-line tool does.

use std::sync::Arc;

use insta::assert_snapshot;
use rstest::rstest;

use weft_engine::{Engine, EnginePolicy, FormatRunError};
use weft_formatters::{
    CommandExecutor, CommandSpec, FormatError, FormatOptions, FormatterBackend,
    FormatterDefinition, FormatterRegistry, FormatterRunner, UnavailablePluginLoader,
};
use weft_syntax::InjectionCatalog;

/// Upper-cases its input without spawning a process.
#[derive(Debug, Clone, Copy)]
struct UpperExecutor;

impl CommandExecutor for UpperExecutor {
    fn run(
        &self,
        _spec: &CommandSpec,
        _args: &[String],
        input: &[u8],
    ) -> Result<Vec<u8>, FormatError> {
        Ok(input.to_ascii_uppercase())
    }
}

fn registry(cmd: &str, args: &[&str], languages: &[&str]) -> FormatterRegistry {
    let mut registry = FormatterRegistry::new();
    registry
        .register(FormatterDefinition::new(
            "sqlfmt",
            FormatterBackend::ExternalCommand(CommandSpec::new(
                cmd,
                args.iter().map(|arg| (*arg).to_owned()).collect(),
            )),
        ))
        .expect("register formatter");
    for language in languages {
        registry
            .assign(language, vec![String::from("sqlfmt")])
            .expect("assign chain");
    }
    registry
}

fn build_engine<E: CommandExecutor>(
    registry: FormatterRegistry,
    executor: E,
    policy: EnginePolicy,
) -> Engine<InjectionCatalog, FormatterRunner<E>> {
    let runner = FormatterRunner::new(registry, executor, Arc::new(UnavailablePluginLoader));
    Engine::new(
        InjectionCatalog::new(Vec::new()),
        runner,
        policy,
        FormatOptions::default(),
    )
    .expect("engine starts")
}

const RUST_SOURCE: &str = r#"fn main() {
    let users = "SELECT id, name from users where active";
    let label = "not sql";
    let quoted = "SELECT \"id\" from t";
}
"#;

#[rstest]
#[case::sequential(1)]
#[case::parallel(4)]
fn sql_in_rust_is_formatted_in_place(#[case] workers: usize) {
    let engine = build_engine(
        registry("sqlfmt", &[], &["sql"]),
        UpperExecutor,
        EnginePolicy::default().with_worker_limit(workers),
    );
    let out = engine
        .format_document("rust", RUST_SOURCE)
        .expect("formatting succeeds");
    insta::allow_duplicates! {
        assert_snapshot!(out.trim_end(), @r#"
        fn main() {
            let users = "SELECT ID, NAME FROM USERS WHERE ACTIVE";
            let label = "not sql";
            let quoted = "SELECT \"ID\" FROM T";
        }
        "#);
    }
}

#[test]
fn formatting_is_idempotent() {
    let engine = build_engine(
        registry("sqlfmt", &[], &["sql"]),
        UpperExecutor,
        EnginePolicy::default(),
    );
    let once = engine
        .format_document("rust", RUST_SOURCE)
        .expect("first run");
    let twice = engine.format_document("rust", &once).expect("second run");
    assert_eq!(twice, once);
}

#[test]
fn languages_without_formatters_are_unchanged() {
    let engine = build_engine(
        registry("sqlfmt", &[], &[]),
        UpperExecutor,
        EnginePolicy::default(),
    );
    let out = engine
        .format_document("rust", RUST_SOURCE)
        .expect("nothing to format");
    assert_eq!(out, RUST_SOURCE);
}

#[test]
fn unknown_host_languages_are_returned_as_is() {
    let engine = build_engine(
        registry("sqlfmt", &[], &["sql"]),
        UpperExecutor,
        EnginePolicy::default(),
    );
    let text = "\"SELECT 1\"";
    let out = engine
        .format_document("markdown", text)
        .expect("no grammar, no regions");
    assert_eq!(out, text);
}

#[test]
fn offsets_strip_the_quotes_from_regions() {
    let engine = build_engine(
        registry("sqlfmt", &[], &["sql"]),
        UpperExecutor,
        EnginePolicy::default(),
    );
    let source = "fn f() { g(\"SELECT 1\"); }";
    let literal = source.find('"').expect("literal present");
    let tree = engine.discover("rust", source).expect("discovery");

    let root = tree.get(tree.root());
    let ranges: Vec<_> = root
        .children
        .iter()
        .map(|&id| tree.get(id).range.clone())
        .collect();
    assert_eq!(ranges, [literal + 1..literal + 9]);
}

#[test]
fn python_hosts_use_their_own_query() {
    let engine = build_engine(
        registry("sqlfmt", &[], &["sql"]),
        UpperExecutor,
        EnginePolicy::default(),
    );
    let out = engine
        .format_document("python", "q = \"SELECT x from y\"\n")
        .expect("formatting succeeds");
    assert_eq!(out, "q = \"SELECT X FROM Y\"\n");
}

#[cfg(unix)]
mod process {
    use weft_formatters::ProcessExecutor;

    use super::*;

    #[test]
    fn external_commands_format_regions() {
        let engine = build_engine(
            registry("tr", &["a-z", "A-Z"], &["sql"]),
            ProcessExecutor,
            EnginePolicy::default(),
        );
        let out = engine
            .format_document("rust", "let q = \"SELECT a from b\";\n")
            .expect("formatting succeeds");
        assert_eq!(out, "let q = \"SELECT A FROM B\";\n");
    }

    #[test]
    fn a_failing_command_fails_the_run_without_output() {
        let engine = build_engine(
            registry("sh", &["-c", "echo 'syntax error' >&2; exit 3"], &["sql"]),
            ProcessExecutor,
            EnginePolicy::default(),
        );
        let err = engine
            .format_document("rust", "let q = \"SELECT a from b\";\n")
            .expect_err("formatter fails");

        assert!(matches!(err, FormatRunError::Formatting(ref failures) if failures.len() == 1));
        let message = err.to_string();
        assert!(message.contains("exit code 3"), "{message}");
        assert!(message.contains("syntax error"), "{message}");
    }
}
