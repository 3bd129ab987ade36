//! Error types for the CLI runtime.

use std::io;

use thiserror::Error;
use weft_config::ConfigError;
use weft_engine::FormatRunError;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to start the formatting engine: {0}")]
    Engine(#[source] FormatRunError),
    #[error("{input}: cannot infer the host language; pass --language")]
    MissingLanguage { input: String },
    #[error("{input}: failed to read input: {source}")]
    ReadInput {
        input: String,
        #[source]
        source: io::Error,
    },
    #[error("{input}: failed to write output: {source}")]
    WriteOutput {
        input: String,
        #[source]
        source: io::Error,
    },
    #[error("{input}: {source}")]
    Format {
        input: String,
        #[source]
        source: FormatRunError,
    },
}
