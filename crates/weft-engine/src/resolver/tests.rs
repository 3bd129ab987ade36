//! Unit tests for region resolution.

use rstest::{fixture, rstest};

use super::*;
use crate::discover::discover;
use crate::policy::FailurePolicy;
use crate::tests::{DelimitedSource, ScriptedDispatch};

/// `<...>` in the host is markdown; `{...}` in markdown is SQL; `"..."` in
/// the host is JSON with escaped quotes.
#[fixture]
fn source() -> DelimitedSource {
    DelimitedSource::new()
        .rule("host", '<', '>', "md", None)
        .rule("host", '"', '"', "json", Some('"'))
        .rule("md", '{', '}', "sql", None)
}

fn sequential() -> EnginePolicy {
    EnginePolicy::default().with_worker_limit(1)
}

fn resolve(
    source: &DelimitedSource,
    dispatch: &ScriptedDispatch,
    policy: &EnginePolicy,
    text: &str,
) -> Result<String, FormatRunError> {
    let tree = discover(source, dispatch, policy, "host", text)?;
    let options = FormatOptions::with_width(60);
    Resolver::new(&tree, dispatch, &options, policy).run()
}

#[rstest]
fn inner_regions_are_formatted_before_their_parents(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new()
        .chain("sql", &["upper"])
        .chain("md", &["wrap"]);
    let out = resolve(&source, &dispatch, &sequential(), "a <x {select 1} y> b")
        .expect("resolution succeeds");

    assert_eq!(out, "a <(x {SELECT 1} y)> b");
    assert_eq!(
        dispatch.calls(),
        [
            (String::from("upper"), String::from("select 1")),
            (String::from("wrap"), String::from("x {SELECT 1} y")),
        ]
    );
}

#[rstest]
fn chains_run_in_configured_order(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new().chain("sql", &["trim", "width", "upper"]);
    let out = resolve(&source, &dispatch, &sequential(), "<{  select 1  }>")
        .expect("resolution succeeds");
    assert_eq!(out, "<{SELECT 1@60}>");
}

#[rstest]
fn escapes_are_removed_for_formatters_and_restored(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new().chain("json", &["upper"]);
    let out = resolve(&source, &dispatch, &sequential(), r#"v = "{\"k\": 1}";"#)
        .expect("resolution succeeds");
    assert_eq!(out, r#"v = "{\"K\": 1}";"#);
    assert_eq!(
        dispatch.calls(),
        [(String::from("upper"), String::from(r#"{"k": 1}"#))]
    );
}

#[rstest]
fn languages_without_formatters_pass_through(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new();
    let text = "keep <this {as is}> \"and \\\"this\\\"\"";
    let out = resolve(&source, &dispatch, &sequential(), text).expect("resolution succeeds");
    assert_eq!(out, text);
    assert!(dispatch.calls().is_empty());
}

#[rstest]
fn empty_regions_are_formatted_as_empty_input(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new().chain("sql", &["wrap"]);
    let out = resolve(&source, &dispatch, &sequential(), "<{}>").expect("resolution succeeds");
    assert_eq!(out, "<{()}>");
}

#[rstest]
fn the_host_chain_runs_last_over_the_assembled_document(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new()
        .chain("sql", &["upper"])
        .chain("host", &["wrap"]);
    let out = resolve(&source, &dispatch, &sequential(), "<{x}>").expect("resolution succeeds");
    assert_eq!(out, "(<{X}>)");
}

#[rstest]
fn a_failure_fails_the_run_and_stops_dispatch(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new()
        .chain("sql", &["fail"])
        .chain("md", &["upper"]);
    let err = resolve(&source, &dispatch, &sequential(), "<{a}> <{b}>").expect_err("fails");

    assert_eq!(err.count(), 1);
    assert_eq!(
        dispatch.calls(),
        [(String::from("fail"), String::from("a"))],
        "no region may be dispatched after the first failure"
    );
}

#[rstest]
fn keep_going_reports_every_failure(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new()
        .chain("sql", &["fail"])
        .chain("md", &["upper"]);
    let policy = sequential().with_keep_going(true);
    let err = resolve(&source, &dispatch, &policy, "<{a}> <{b}>").expect_err("fails");

    let failures = match err {
        FormatRunError::Formatting(failures) => failures,
        other => panic!("expected formatting failures, got {other}"),
    };
    let ranges: Vec<_> = failures.iter().map(|f| f.region.range.clone()).collect();
    assert_eq!(ranges, [1..2, 1..2]);
    assert!(failures.iter().all(|f| f.formatter == "fail"));
    assert!(
        dispatch.calls().iter().all(|(id, _)| id == "fail"),
        "parents of failed regions are never formatted"
    );
}

#[rstest]
fn passthrough_keeps_child_resolved_text(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new()
        .chain("sql", &["upper"])
        .chain("md", &["fail"]);
    let policy = sequential().with_failure_policy(FailurePolicy::Passthrough);
    let out = resolve(&source, &dispatch, &policy, "<x {select 1}>").expect("passes through");
    assert_eq!(out, "<x {SELECT 1}>");
}

#[rstest]
fn plugin_load_errors_are_fatal_even_with_passthrough(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new().chain("sql", &["missing_plugin"]);
    let policy = sequential().with_failure_policy(FailurePolicy::Passthrough);
    let err = resolve(&source, &dispatch, &policy, "<{a}>").expect_err("load fails");
    assert!(err.to_string().contains("file:///missing.wasm"));
}

#[rstest]
fn non_utf8_output_is_a_failure(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new().chain("sql", &["binary"]);
    let err = resolve(&source, &dispatch, &sequential(), "<{a}>").expect_err("invalid output");
    assert!(matches!(
        err,
        FormatRunError::Formatting(ref failures)
            if matches!(failures.as_slice(), [RegionFailure { cause: FailureCause::NonUtf8Output, .. }])
    ));
}

#[rstest]
fn parallel_and_sequential_resolution_agree(source: DelimitedSource) {
    let text = "<{a}{b}{c}> <{d}> \"e\" <x {f} y>";
    let dispatch = ScriptedDispatch::new()
        .chain("sql", &["upper"])
        .chain("md", &["wrap"])
        .chain("json", &["wrap"]);
    let parallel = EnginePolicy::default().with_worker_limit(4);

    let expected = resolve(&source, &dispatch, &sequential(), text).expect("sequential");
    let actual = resolve(&source, &dispatch, &parallel, text).expect("parallel");
    assert_eq!(actual, expected);
    assert_eq!(actual, "<({A}{B}{C})> <({D})> \"(e)\" <(x {F} y)>");
}

#[rstest]
fn cancellation_stops_a_chain_between_formatters(source: DelimitedSource) {
    let dispatch = ScriptedDispatch::new().chain("sql", &["upper", "wrap"]);
    let policy = sequential();
    let tree = discover(&source, &dispatch, &policy, "host", "<{select 1}>")
        .expect("discovery succeeds");
    let options = FormatOptions::with_width(60);
    let resolver = Resolver::new(&tree, &dispatch, &options, &policy);
    let (_, sql) = tree
        .iter()
        .find(|(_, region)| region.language == "sql")
        .expect("sql region");

    resolver.cancelled.store(true, Ordering::Release);
    assert_eq!(resolver.run_chain(sql, sql.local.clone()), None);
    assert!(dispatch.calls().is_empty());
}
