//! The `format` subcommand.

use std::fmt;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::debug;
use weft_config::Config;
use weft_engine::Engine;
use weft_formatters::{ComponentLoader, FormatterRunner, ProcessExecutor};
use weft_syntax::{InjectionCatalog, SupportedLanguage};

use crate::IoStreams;
use crate::cli::FormatArgs;
use crate::errors::AppError;

const FORMAT_TARGET: &str = "weft_cli::format";

type ProcessEngine = Engine<InjectionCatalog, FormatterRunner<ProcessExecutor>>;

/// One document to format.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    fn from_path(path: &Path) -> Self {
        if path == Path::new("-") {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    fn read<R: Read>(&self, stdin: &mut R) -> Result<String, AppError> {
        let result = match self {
            Self::Stdin => {
                let mut text = String::new();
                stdin.read_to_string(&mut text).map(|_| text)
            }
            Self::File(path) => fs::read_to_string(path),
        };
        result.map_err(|source| AppError::ReadInput {
            input: self.to_string(),
            source,
        })
    }

    fn write_error(&self, source: std::io::Error) -> AppError {
        AppError::WriteOutput {
            input: self.to_string(),
            source,
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Builds an engine that runs configured formatters as child processes or
/// wasmtime plugin components.
pub(crate) fn build_engine(config: &Config) -> Result<ProcessEngine, AppError> {
    let runner = FormatterRunner::new(
        config.formatter_registry()?,
        ProcessExecutor,
        Arc::new(ComponentLoader::new()),
    );
    Engine::new(
        InjectionCatalog::new(config.query_paths.clone()),
        runner,
        config.engine_policy(),
        config.format_options(),
    )
    .map_err(AppError::Engine)
}

/// Formats every input, reporting per-input failures to stderr.
///
/// Exits with failure when any input failed, or in check mode when any
/// input would change.
pub(crate) fn run<R, W, E>(
    args: &FormatArgs,
    config: &Config,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<ExitCode, AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let engine = build_engine(config)?;
    let inputs: Vec<Input> = if args.files.is_empty() {
        vec![Input::Stdin]
    } else {
        args.files
            .iter()
            .map(PathBuf::as_path)
            .map(Input::from_path)
            .collect()
    };

    let mut failed = false;
    let mut changed = false;
    for input in &inputs {
        match format_input(&engine, args, input, io) {
            Ok(input_changed) => changed |= input_changed,
            Err(error) => {
                failed = true;
                crate::report(io.stderr, &error);
            }
        }
    }

    debug!(
        target: FORMAT_TARGET,
        inputs = inputs.len(),
        changed,
        failed,
        "format finished"
    );
    if failed || (args.check && changed) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Formats one input, returning whether its text changed.
fn format_input<R, W, E>(
    engine: &ProcessEngine,
    args: &FormatArgs,
    input: &Input,
    io: &mut IoStreams<'_, R, W, E>,
) -> Result<bool, AppError>
where
    R: Read,
    W: Write,
    E: Write,
{
    let language = host_language(args.language.as_deref(), input)?;
    let text = input.read(io.stdin)?;
    debug!(
        target: FORMAT_TARGET,
        %input,
        language = %language,
        bytes = text.len(),
        "formatting input"
    );

    let formatted = engine
        .format_document(&language, &text)
        .map_err(|source| AppError::Format {
            input: input.to_string(),
            source,
        })?;
    let changed = formatted != text;

    match input {
        _ if args.check => {
            if changed {
                writeln!(io.stderr, "{input}: would be reformatted")
                    .map_err(|err| input.write_error(err))?;
            }
        }
        Input::File(path) if args.write => {
            if changed {
                fs::write(path, &formatted).map_err(|err| input.write_error(err))?;
            }
        }
        Input::File(_) | Input::Stdin => {
            io.stdout
                .write_all(formatted.as_bytes())
                .and_then(|()| io.stdout.flush())
                .map_err(|err| input.write_error(err))?;
        }
    }
    Ok(changed)
}

fn host_language(explicit: Option<&str>, input: &Input) -> Result<String, AppError> {
    if let Some(language) = explicit {
        return Ok(language.to_owned());
    }
    let inferred = match input {
        Input::File(path) => SupportedLanguage::from_path(path),
        Input::Stdin => None,
    };
    inferred
        .map(|language| language.as_str().to_owned())
        .ok_or_else(|| AppError::MissingLanguage {
            input: input.to_string(),
        })
}
