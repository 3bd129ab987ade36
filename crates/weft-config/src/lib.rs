//! Shared configuration for the `weft` command-line tool.
//!
//! [`Config`] is read from a TOML file, overridden by `WEFT_*` environment
//! variables and finally by command-line flags. It turns into the three
//! values a formatting run needs: a
//! [`FormatterRegistry`](weft_formatters::FormatterRegistry), the
//! [`FormatOptions`](weft_formatters::FormatOptions) handed to every
//! formatter and the engine's [`EnginePolicy`](weft_engine::EnginePolicy).

mod config;
mod defaults;
mod error;
mod logging;

pub use self::config::{
    Config, ConfigSources, ENV_LOG_FILTER, ENV_LOG_FORMAT, ENV_PREFIX, ENV_TEXTWIDTH,
};
pub use self::defaults::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_LOG_FILTER, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use self::error::ConfigError;
pub use self::logging::{LogFormat, LogFormatParseError};
