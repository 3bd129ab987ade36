//! Configuration loading for the CLI.
//!
//! The file and environment layers come from `weft-config`; command-line
//! flags are applied on top here.

use std::path::Path;

use weft_config::{Config, ConfigError, ConfigSources};

use crate::cli::{Cli, CliCommand};

pub(crate) trait ConfigLoader {
    /// Loads the file and environment layers of the configuration.
    fn load(&self, explicit_path: Option<&Path>) -> Result<Config, ConfigError>;
}

/// Reads configuration from the real working directory and environment.
pub(crate) struct ProcessConfigLoader;

impl ConfigLoader for ProcessConfigLoader {
    fn load(&self, explicit_path: Option<&Path>) -> Result<Config, ConfigError> {
        Config::load(&ConfigSources::from_process(
            explicit_path.map(Path::to_path_buf),
        ))
    }
}

/// Applies command-line flags, the highest-precedence layer.
pub(crate) fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<(), ConfigError> {
    if let Some(filter) = &cli.log_filter {
        config.log_filter.clone_from(filter);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    match &cli.command {
        CliCommand::Format(args) => {
            if let Some(width) = args.textwidth {
                config.textwidth = width;
            }
            if let Some(jobs) = args.jobs {
                config.worker_limit = Some(jobs);
            }
            config.keep_going |= args.keep_going;
        }
    }
    config.validate()
}
