//! Built-in configuration defaults.

use weft_formatters::DEFAULT_TEXTWIDTH;

use crate::logging::LogFormat;

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Name of the configuration file looked up in the working directory and
/// the user configuration directory.
pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// Directory under the user configuration directory holding
/// [`CONFIG_FILE_NAME`].
pub const CONFIG_DIR_NAME: &str = "weft";

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

pub(crate) const fn default_textwidth() -> usize {
    DEFAULT_TEXTWIDTH
}

pub(crate) const fn default_max_depth() -> usize {
    weft_engine::DEFAULT_MAX_DEPTH
}
