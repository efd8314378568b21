//! Built-in settings used when no layer supplies a value.

use std::time::Duration;

/// Deadline for obtaining the first cluster configuration, in milliseconds.
pub const DEFAULT_CONFIG_TIMEOUT_MS: u64 = 5_000;

/// Number of suspicious transport errors tolerated before a refresh.
pub const DEFAULT_WEIRD_THINGS_THRESHOLD: u32 = 100;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default configuration deadline as a [`Duration`].
pub const fn default_config_timeout() -> Duration {
    Duration::from_millis(DEFAULT_CONFIG_TIMEOUT_MS)
}

pub(crate) const fn default_config_timeout_ms() -> u64 {
    DEFAULT_CONFIG_TIMEOUT_MS
}

pub(crate) const fn default_weird_things_threshold() -> u32 {
    DEFAULT_WEIRD_THINGS_THRESHOLD
}

/// Default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}
