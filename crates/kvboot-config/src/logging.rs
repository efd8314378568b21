//! Output format for client diagnostics.
//!
//! Selected by the `log_format` setting, so it can be supplied as
//! `log_format = "compact"` in `kvboot.toml`, as `KVBOOT_LOG_FORMAT` or as
//! `--log-format`. Values are matched without regard to case.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How bootstrap and setup events are rendered on stderr.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened to the top level.
    #[default]
    Json,
    /// Single-line text for terminals.
    Compact,
}

impl LogFormat {
    /// Returns `true` for formats meant for log collectors rather than people.
    ///
    /// Structured output never carries terminal colour codes.
    #[must_use]
    pub const fn is_structured(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Raised when `log_format` names an unknown format.
pub type LogFormatParseError = strum::ParseError;
