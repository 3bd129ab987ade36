//! Configuration errors.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use weft_formatters::FormatError;

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file '{path}': {source}")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid TOML for [`crate::Config`].
    #[error("invalid configuration file '{path}': {source}")]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// An environment variable holds a value of the wrong shape.
    #[error("environment variable {name}='{value}' is invalid: {message}")]
    Environment {
        /// Variable name.
        name: String,
        /// Value that was rejected.
        value: String,
        /// Why the value was rejected.
        message: String,
    },

    /// A configuration value is out of range.
    #[error("invalid value for '{field}': {message}")]
    InvalidValue {
        /// Configuration key.
        field: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// The formatter section could not be turned into a registry.
    #[error("invalid formatter configuration: {0}")]
    Formatters(#[from] FormatError),
}

impl ConfigError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::Parse {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn environment(
        name: &str,
        value: &str,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Environment {
            name: name.to_owned(),
            value: value.to_owned(),
            message: message.to_string(),
        }
    }
}
