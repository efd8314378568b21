//! Client status codes reported asynchronously to the owning instance.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Outcome recorded on the instance after a bootstrap attempt settles.
///
/// The configuration monitor reports its most recent failure with the same
/// vocabulary, so a monitor error can be passed through to the instance
/// verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No error.
    #[default]
    Success,
    /// The configuration deadline elapsed.
    TimedOut,
    /// A transport-level failure while talking to a node.
    NetworkError,
    /// No configured node accepted a connection.
    ConnectFailed,
    /// The cluster rejected the supplied credentials.
    AuthenticationFailed,
    /// The requested bucket does not exist on the cluster.
    BucketNotFound,
    /// A node answered with a payload the client could not interpret.
    ProtocolError,
    /// The client ran out of memory while handling the configuration.
    NoMemory,
}

impl ErrorCode {
    /// Returns `true` for [`ErrorCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::TimedOut => "timed_out",
            Self::NetworkError => "network_error",
            Self::ConnectFailed => "connect_failed",
            Self::AuthenticationFailed => "authentication_failed",
            Self::BucketNotFound => "bucket_not_found",
            Self::ProtocolError => "protocol_error",
            Self::NoMemory => "no_memory",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing an error code fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported error code: {0}")]
pub struct ErrorCodeParseError(String);

impl ErrorCodeParseError {
    /// Returns the offending value that could not be parsed.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for ErrorCode {
    type Err = ErrorCodeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "success" => Ok(Self::Success),
            "timed_out" | "timeout" => Ok(Self::TimedOut),
            "network_error" => Ok(Self::NetworkError),
            "connect_failed" => Ok(Self::ConnectFailed),
            "authentication_failed" => Ok(Self::AuthenticationFailed),
            "bucket_not_found" => Ok(Self::BucketNotFound),
            "protocol_error" => Ok(Self::ProtocolError),
            "no_memory" => Ok(Self::NoMemory),
            other => Err(ErrorCodeParseError(other.to_owned())),
        }
    }
}
