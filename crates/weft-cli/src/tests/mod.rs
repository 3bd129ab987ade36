//! In-process tests for the CLI runtime.

use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use rstest::rstest;
use tempfile::TempDir;
use weft_config::{Config, ConfigError};
use weft_formatters::{CommandSpec, FormatterBackend, PluginReference};

use crate::cli::{Cli, CliCommand};
use crate::config::{ConfigLoader, apply_overrides};
use crate::{IoStreams, run_with_loader};

/// Returns a fixed configuration regardless of the requested path.
struct FixedLoader(Config);

impl ConfigLoader for FixedLoader {
    fn load(&self, _explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
        Ok(self.0.clone())
    }
}

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn run_cli(config: Config, args: &[&str], stdin: &str) -> Outcome {
    let mut input = Cursor::new(stdin.as_bytes().to_vec());
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let argv = std::iter::once("weft").chain(args.iter().copied()).map(OsString::from);
    let exit = {
        let mut io = IoStreams {
            stdin: &mut input,
            stdout: &mut stdout,
            stderr: &mut stderr,
        };
        run_with_loader(argv, &mut io, &FixedLoader(config))
    };
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

fn sql_config(cmd: &str, args: &[&str]) -> Config {
    let mut config = Config::default();
    config.formatters.insert(
        String::from("sqlfmt"),
        FormatterBackend::ExternalCommand(CommandSpec::new(
            cmd,
            args.iter().map(|arg| (*arg).to_owned()).collect(),
        )),
    );
    config
        .languages
        .insert(String::from("sql"), vec![String::from("sqlfmt")]);
    config.worker_limit = Some(1);
    config
}

const RUST_INPUT: &str = "let q = \"SELECT a from b\";\n";
const RUST_OUTPUT: &str = "let q = \"SELECT A FROM B\";\n";

#[test]
fn help_goes_to_stdout() {
    let outcome = run_cli(Config::default(), &["--help"], "");
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("format"), "{}", outcome.stdout);
}

#[test]
fn usage_errors_exit_with_two() {
    let outcome = run_cli(Config::default(), &["format", "--no-such-flag"], "");
    assert_eq!(outcome.exit, ExitCode::from(2));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("--no-such-flag"), "{}", outcome.stderr);
}

#[test]
fn stdin_requires_a_language() {
    let outcome = run_cli(Config::default(), &["format"], RUST_INPUT);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("--language"), "{}", outcome.stderr);
}

#[test]
fn stdin_without_formatters_is_echoed() {
    let outcome = run_cli(Config::default(), &["format", "-l", "rust"], RUST_INPUT);
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert_eq!(outcome.stdout, RUST_INPUT);
}

#[test]
fn undefined_formatters_fail_before_reading_input() {
    let mut config = Config::default();
    config
        .languages
        .insert(String::from("sql"), vec![String::from("missing")]);
    let outcome = run_cli(config, &["format", "-l", "rust"], RUST_INPUT);
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("missing"), "{}", outcome.stderr);
}

const UPPER_COMPONENT: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../weft-formatters/tests/fixtures/upper.wat"
);

fn plugin_config(plugin: &str) -> Config {
    let mut config = Config::default();
    config.formatters.insert(
        String::from("upper"),
        FormatterBackend::WasmPlugin(PluginReference::new(plugin)),
    );
    config
        .languages
        .insert(String::from("sql"), vec![String::from("upper")]);
    config
}

#[test]
fn plugin_components_format_embedded_regions() {
    let config = plugin_config(&format!("file://{UPPER_COMPONENT}"));
    let outcome = run_cli(config, &["format", "-l", "rust", "--jobs", "2"], RUST_INPUT);
    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    assert_eq!(outcome.stdout, RUST_OUTPUT);
}

#[test]
fn missing_plugin_components_fail_the_run() {
    let outcome = run_cli(
        plugin_config("/nonexistent/weft/upper.wasm"),
        &["format", "-l", "rust"],
        RUST_INPUT,
    );
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stdout.is_empty());
    assert!(
        outcome.stderr.contains("/nonexistent/weft/upper.wasm"),
        "{}",
        outcome.stderr
    );
}

#[cfg(unix)]
mod process {
    use super::*;

    #[test]
    fn stdin_is_formatted_to_stdout() {
        let outcome = run_cli(sql_config("tr", &["a-z", "A-Z"]), &["format", "-l", "rust"], RUST_INPUT);
        assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
        assert_eq!(outcome.stdout, RUST_OUTPUT);
    }

    #[test]
    fn failing_formatters_emit_no_document() {
        let config = sql_config("sh", &["-c", "echo 'bad input' >&2; exit 4"]);
        let outcome = run_cli(config, &["format", "-l", "rust"], RUST_INPUT);
        assert_eq!(outcome.exit, ExitCode::FAILURE);
        assert!(outcome.stdout.is_empty(), "{}", outcome.stdout);
        assert!(outcome.stderr.contains("<stdin>"), "{}", outcome.stderr);
        assert!(outcome.stderr.contains("bad input"), "{}", outcome.stderr);
    }

    #[test]
    fn check_reports_files_that_would_change() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("query.rs");
        fs::write(&path, RUST_INPUT).expect("write input");
        let file = path.to_str().expect("utf8 path");

        let outcome = run_cli(sql_config("tr", &["a-z", "A-Z"]), &["format", "--check", file], "");

        assert_eq!(outcome.exit, ExitCode::FAILURE);
        assert!(outcome.stdout.is_empty());
        assert!(outcome.stderr.contains("would be reformatted"), "{}", outcome.stderr);
        assert_eq!(fs::read_to_string(&path).expect("read back"), RUST_INPUT);
    }

    #[test]
    fn write_rewrites_files_in_place() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("query.rs");
        fs::write(&path, RUST_INPUT).expect("write input");
        let file = path.to_str().expect("utf8 path");
        let config = sql_config("tr", &["a-z", "A-Z"]);

        let written = run_cli(config.clone(), &["format", "--write", file], "");
        assert_eq!(written.exit, ExitCode::SUCCESS, "{}", written.stderr);
        assert!(written.stdout.is_empty());
        assert_eq!(fs::read_to_string(&path).expect("read back"), RUST_OUTPUT);

        let checked = run_cli(config, &["format", "--check", file], "");
        assert_eq!(checked.exit, ExitCode::SUCCESS, "{}", checked.stderr);
    }

    #[test]
    fn one_failing_file_does_not_stop_the_others() {
        let dir = TempDir::new().expect("temp dir");
        let good = dir.path().join("good.rs");
        fs::write(&good, RUST_INPUT).expect("write input");
        let missing = dir.path().join("missing.rs");

        let outcome = run_cli(
            sql_config("tr", &["a-z", "A-Z"]),
            &[
                "format",
                missing.to_str().expect("utf8 path"),
                good.to_str().expect("utf8 path"),
            ],
            "",
        );

        assert_eq!(outcome.exit, ExitCode::FAILURE);
        assert_eq!(outcome.stdout, RUST_OUTPUT);
        assert!(outcome.stderr.contains("missing.rs"), "{}", outcome.stderr);
    }
}

#[test]
fn unknown_extensions_need_a_language() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("notes.txt");
    fs::write(&path, "text").expect("write input");
    let outcome = run_cli(
        Config::default(),
        &["format", path.to_str().expect("utf8 path")],
        "",
    );
    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert!(outcome.stderr.contains("notes.txt"), "{}", outcome.stderr);
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("weft").chain(args.iter().copied()))
        .expect("valid command line")
}

#[test]
fn flags_override_configuration() {
    let cli = parse(&[
        "--log-filter",
        "debug",
        "--log-format",
        "json",
        "format",
        "--textwidth",
        "120",
        "--jobs",
        "3",
        "--keep-going",
    ]);
    let mut config = Config::default();
    apply_overrides(&cli, &mut config).expect("valid overrides");

    assert_eq!(config.log_filter(), "debug");
    assert_eq!(config.log_format(), weft_config::LogFormat::Json);
    assert_eq!(config.textwidth, 120);
    assert_eq!(config.worker_limit, Some(3));
    assert!(config.keep_going);
}

#[rstest]
#[case::textwidth(&["format", "--textwidth", "0"])]
#[case::jobs(&["format", "--jobs", "0"])]
fn zero_limits_are_rejected(#[case] args: &[&str]) {
    let cli = parse(args);
    let mut config = Config::default();
    assert!(apply_overrides(&cli, &mut config).is_err());
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = parse(&["format", "--config-path", "custom.toml", "a.rs"]);
    assert_eq!(
        cli.config_path.as_deref(),
        Some(Path::new("custom.toml"))
    );
    let CliCommand::Format(args) = cli.command;
    assert_eq!(args.files, [Path::new("a.rs")]);
}

#[test]
fn check_and_write_conflict() {
    assert!(Cli::try_parse_from(["weft", "format", "--check", "--write"]).is_err());
}
