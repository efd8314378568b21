//! Shared settings for the kvboot bootstrap coordinator.
//!
//! [`Settings`] is resolved through `ortho_config`, layering built-in defaults,
//! an optional configuration file, `KVBOOT_*` environment variables, and CLI
//! flags in increasing order of precedence. The coordinator only reads two
//! values: the deadline for the initial configuration and the threshold of
//! suspicious transport errors that forces a refresh. The remaining fields
//! drive structured logging.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use defaults::{
    DEFAULT_CONFIG_TIMEOUT_MS, DEFAULT_LOG_FILTER, DEFAULT_WEIRD_THINGS_THRESHOLD,
    default_config_timeout, default_log_filter, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved client settings consumed by the bootstrap coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "KVBOOT")]
pub struct Settings {
    /// Deadline for the initial configuration, in milliseconds.
    #[serde(default = "defaults::default_config_timeout_ms")]
    pub config_timeout_ms: u64,
    /// Suspicious transport errors tolerated before a refresh. Zero disables
    /// the error-triggered refresh.
    #[serde(default = "defaults::default_weird_things_threshold")]
    pub weird_things_threshold: u32,
    /// `tracing` filter expression.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_timeout_ms: DEFAULT_CONFIG_TIMEOUT_MS,
            weird_things_threshold: DEFAULT_WEIRD_THINGS_THRESHOLD,
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Settings {
    /// Deadline for the initial configuration.
    #[must_use]
    pub const fn config_timeout(&self) -> Duration {
        Duration::from_millis(self.config_timeout_ms)
    }

    /// Number of suspicious errors that triggers a refresh.
    #[must_use]
    pub const fn weird_things_threshold(&self) -> u32 {
        self.weird_things_threshold
    }

    /// Returns the configured log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Rejects settings the coordinator cannot honour.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.config_timeout_ms == 0 {
            return Err(SettingsError::ZeroConfigTimeout);
        }
        if self.log_filter.trim().is_empty() {
            return Err(SettingsError::EmptyLogFilter);
        }
        Ok(())
    }
}

/// Errors raised by [`Settings::validate`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// A zero deadline would time out before any fetch could start.
    #[error("config_timeout_ms must be greater than zero")]
    ZeroConfigTimeout,
    /// The log filter expression was blank.
    #[error("log_filter must not be empty")]
    EmptyLogFilter,
}
