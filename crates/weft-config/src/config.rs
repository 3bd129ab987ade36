//! The `weft` configuration model and its loading rules.
//!
//! Values are layered from lowest to highest precedence:
//!
//! 1. built-in defaults,
//! 2. the configuration file,
//! 3. `WEFT_*` environment variables,
//! 4. command-line flags, applied by the caller after [`Config::load`].
//!
//! The configuration file is the explicit `--config-path` when given, else
//! `weft.toml` in the working directory, else `weft/weft.toml` in the user
//! configuration directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use weft_engine::{EnginePolicy, FailurePolicy};
use weft_formatters::{FormatOptions, FormatterBackend, FormatterDefinition, FormatterRegistry};

use crate::defaults::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, default_log_filter_string, default_log_format,
    default_max_depth, default_textwidth,
};
use crate::error::ConfigError;
use crate::logging::LogFormat;

const CONFIG_TARGET: &str = "weft_config";

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "WEFT_";
/// Overrides [`Config::log_filter`].
pub const ENV_LOG_FILTER: &str = "WEFT_LOG_FILTER";
/// Overrides [`Config::log_format`].
pub const ENV_LOG_FORMAT: &str = "WEFT_LOG_FORMAT";
/// Overrides [`Config::textwidth`].
pub const ENV_TEXTWIDTH: &str = "WEFT_TEXTWIDTH";

/// Resolved `weft` configuration.
///
/// ```toml
/// textwidth = 100
/// on_formatter_failure = "passthrough"
///
/// [languages]
/// sql = ["pg_format"]
/// markdown = []
///
/// [formatters.pg_format]
/// cmd = "pg_format"
/// args = ["--wrap-limit", "$textwidth", "-"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `tracing` filter directive for the log subscriber.
    pub log_filter: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// Line width handed to formatters as `$textwidth`.
    pub textwidth: usize,
    /// Concurrent region limit; unset means one per available CPU.
    pub worker_limit: Option<usize>,
    /// Deepest region nesting accepted.
    pub max_depth: usize,
    /// Reject regions whose language has no formatter chain.
    pub strict: bool,
    /// Report every failing region instead of stopping at the first.
    pub keep_going: bool,
    /// Handling of formatter failures.
    pub on_formatter_failure: FailurePolicy,
    /// Directories searched for `<language>/injections.scm` overrides.
    pub query_paths: Vec<PathBuf>,
    /// Extra `$name` placeholders for formatter arguments.
    pub variables: BTreeMap<String, String>,
    /// Formatter chain per language, applied in order.
    pub languages: BTreeMap<String, Vec<String>>,
    /// Formatter definitions by identifier.
    pub formatters: BTreeMap<String, FormatterBackend>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            textwidth: default_textwidth(),
            worker_limit: None,
            max_depth: default_max_depth(),
            strict: false,
            keep_going: false,
            on_formatter_failure: FailurePolicy::Fail,
            query_paths: Vec::new(),
            variables: BTreeMap::new(),
            languages: BTreeMap::new(),
            formatters: BTreeMap::new(),
        }
    }
}

/// Where configuration is read from.
///
/// [`ConfigSources::from_process`] captures the real process state; tests
/// build the struct directly.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// File named on the command line; it must exist.
    pub explicit_path: Option<PathBuf>,
    /// Directory searched for `weft.toml`.
    pub working_dir: Option<PathBuf>,
    /// User configuration directory searched for `weft.toml`.
    pub user_config_dir: Option<PathBuf>,
    /// `WEFT_*` environment variables.
    pub environment: BTreeMap<String, String>,
}

impl ConfigSources {
    /// Captures the working directory, user configuration directory and
    /// `WEFT_*` environment of the running process.
    #[must_use]
    pub fn from_process(explicit_path: Option<PathBuf>) -> Self {
        let environment = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect();
        Self {
            explicit_path,
            working_dir: std::env::current_dir().ok(),
            user_config_dir: dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME)),
            environment,
        }
    }

    /// Returns the configuration file to read, if any.
    ///
    /// An explicit path is returned whether or not it exists; discovered
    /// candidates are returned only when they are files.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit_path {
            return Some(path.clone());
        }
        [&self.working_dir, &self.user_config_dir]
            .into_iter()
            .flatten()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }
}

impl Config {
    /// Loads configuration from `sources`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, an
    /// environment override is malformed, or a value is out of range.
    pub fn load(sources: &ConfigSources) -> Result<Self, ConfigError> {
        let path = sources.config_path();
        let mut config = match &path {
            Some(file) => Self::from_file(file)?,
            None => Self::default(),
        };
        config.apply_environment(&sources.environment)?;
        config.validate()?;
        debug!(
            target: CONFIG_TARGET,
            path = ?path,
            formatters = config.formatters.len(),
            languages = config.languages.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Reads a configuration file.
    ///
    /// Relative `query_paths` are resolved against the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|err| ConfigError::read(path, err))?;
        let mut config: Self = toml::from_str(&text).map_err(|err| ConfigError::parse(path, err))?;
        if let Some(base) = path.parent() {
            config.query_paths = config
                .query_paths
                .into_iter()
                .map(|query_path| {
                    if query_path.is_relative() {
                        base.join(query_path)
                    } else {
                        query_path
                    }
                })
                .collect();
        }
        Ok(config)
    }

    /// Applies `WEFT_*` overrides from `environment`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Environment`] for a value that does not parse.
    pub fn apply_environment(
        &mut self,
        environment: &BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        if let Some(filter) = environment.get(ENV_LOG_FILTER) {
            self.log_filter.clone_from(filter);
        }
        if let Some(format) = environment.get(ENV_LOG_FORMAT) {
            self.log_format = format
                .parse()
                .map_err(|err| ConfigError::environment(ENV_LOG_FORMAT, format, err))?;
        }
        if let Some(width) = environment.get(ENV_TEXTWIDTH) {
            self.textwidth = width
                .trim()
                .parse()
                .map_err(|err| ConfigError::environment(ENV_TEXTWIDTH, width, err))?;
        }
        Ok(())
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero width, depth or
    /// worker limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: usize| {
            if value == 0 {
                Err(ConfigError::InvalidValue {
                    field,
                    message: String::from("must be at least 1"),
                })
            } else {
                Ok(())
            }
        };
        positive("textwidth", self.textwidth)?;
        positive("max_depth", self.max_depth)?;
        if let Some(limit) = self.worker_limit {
            positive("worker_limit", limit)?;
        }
        Ok(())
    }

    /// Returns the log filter directive.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Builds the formatter registry from `formatters` and `languages`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Formatters`] for an invalid definition or a
    /// language chain naming an undefined formatter.
    pub fn formatter_registry(&self) -> Result<FormatterRegistry, ConfigError> {
        let mut registry = FormatterRegistry::new();
        for (id, backend) in &self.formatters {
            registry.register(FormatterDefinition::new(id.as_str(), backend.clone()))?;
        }
        for (language, chain) in &self.languages {
            registry.assign(language, chain.clone())?;
        }
        Ok(registry)
    }

    /// Builds the options handed to every formatter.
    #[must_use]
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            width: self.textwidth,
            variables: self.variables.clone(),
        }
    }

    /// Builds the engine run policy.
    #[must_use]
    pub fn engine_policy(&self) -> EnginePolicy {
        let policy = EnginePolicy::default()
            .with_max_depth(self.max_depth)
            .with_strict(self.strict)
            .with_keep_going(self.keep_going)
            .with_failure_policy(self.on_formatter_failure);
        match self.worker_limit {
            Some(limit) => policy.with_worker_limit(limit),
            None => policy,
        }
    }
}
