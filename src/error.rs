//! # Error Types
//!
//! Structured errors for the balancing pipeline. Every failure carries its kind
//! and, where one exists, the offending reference or path, so callers decide how
//! to map failures onto exit codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::ConfigurationError;

/// A single item that could not be sized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFailure {
    pub item: String,
    pub kind: ErrorKind,
    pub reason: String,
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.item, self.kind, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BalancerError {
    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Not a file: {path}")]
    NotAFile { path: String },

    #[error("Transient I/O error on {path}: {reason}")]
    TransientIo { path: String, reason: String },

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{} item(s) could not be sized: {}", .failures.len(), summarize_failures(.failures))]
    PartialProbeFailure { failures: Vec<ProbeFailure> },

    #[error("Failed to write manifest {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Run cancelled before stage '{stage}'")]
    Cancelled { stage: String },

    #[error("Execution engine error: {0}")]
    Engine(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error kind without payload, used for structured reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    NotAFile,
    TransientIo,
    Io,
    InvalidConfig,
    PartialProbeFailure,
    WriteFailed,
    Cancelled,
    Engine,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotAFile => "not_a_file",
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::Io => "io",
            ErrorKind::InvalidConfig => "invalid_config",
            ErrorKind::PartialProbeFailure => "partial_probe_failure",
            ErrorKind::WriteFailed => "write_failed",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Engine => "engine",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl BalancerError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn not_a_file(path: impl Into<String>) -> Self {
        Self::NotAFile { path: path.into() }
    }

    pub fn transient(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::TransientIo {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write_failed(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Map a `std::io::Error` raised while touching `path` onto the taxonomy
    ///
    /// Timeouts and connectivity faults are retry-eligible; everything else is
    /// treated as permanent.
    pub fn from_io(path: impl Into<String>, error: &std::io::Error) -> Self {
        use std::io::ErrorKind as IoKind;

        let path = path.into();
        match error.kind() {
            IoKind::NotFound => Self::NotFound { path },
            IoKind::TimedOut
            | IoKind::Interrupted
            | IoKind::WouldBlock
            | IoKind::ConnectionReset
            | IoKind::ConnectionAborted
            | IoKind::ConnectionRefused
            | IoKind::NotConnected
            | IoKind::BrokenPipe => Self::transient(path, error),
            _ => Self::io(path, error),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BalancerError::NotFound { .. } => ErrorKind::NotFound,
            BalancerError::NotAFile { .. } => ErrorKind::NotAFile,
            BalancerError::TransientIo { .. } => ErrorKind::TransientIo,
            BalancerError::Io { .. } => ErrorKind::Io,
            BalancerError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            BalancerError::PartialProbeFailure { .. } => ErrorKind::PartialProbeFailure,
            BalancerError::WriteFailed { .. } => ErrorKind::WriteFailed,
            BalancerError::Cancelled { .. } => ErrorKind::Cancelled,
            BalancerError::Engine(_) => ErrorKind::Engine,
            BalancerError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The offending reference or path, when the error has one
    pub fn path(&self) -> Option<&str> {
        match self {
            BalancerError::NotFound { path }
            | BalancerError::NotAFile { path }
            | BalancerError::TransientIo { path, .. }
            | BalancerError::Io { path, .. }
            | BalancerError::WriteFailed { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, BalancerError::TransientIo { .. })
    }

    /// Convert a per-item error into a failure record for reporting
    pub fn to_probe_failure(&self, item: &str) -> ProbeFailure {
        ProbeFailure {
            item: item.to_string(),
            kind: self.kind(),
            reason: self.to_string(),
        }
    }
}

fn summarize_failures(failures: &[ProbeFailure]) -> String {
    const SHOWN: usize = 5;

    let mut listed: Vec<&str> = failures.iter().take(SHOWN).map(|f| f.item.as_str()).collect();
    if failures.len() > SHOWN {
        listed.push("...");
    }
    listed.join(", ")
}

impl From<ConfigurationError> for BalancerError {
    fn from(error: ConfigurationError) -> Self {
        BalancerError::InvalidConfig(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BalancerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error_mapping() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(
            BalancerError::from_io("/a", &missing),
            BalancerError::not_found("/a")
        );

        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "slow");
        let mapped = BalancerError::from_io("/b", &timed_out);
        assert_eq!(mapped.kind(), ErrorKind::TransientIo);
        assert!(mapped.is_retryable());

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let mapped = BalancerError::from_io("/c", &denied);
        assert_eq!(mapped.kind(), ErrorKind::Io);
        assert!(!mapped.is_retryable());
    }

    #[test]
    fn test_path_is_exposed() {
        assert_eq!(BalancerError::not_a_file("/dir").path(), Some("/dir"));
        assert_eq!(BalancerError::InvalidConfig("k".into()).path(), None);
    }

    #[test]
    fn test_partial_probe_failure_message_truncates() {
        let failures: Vec<ProbeFailure> = (0..7)
            .map(|i| BalancerError::not_found(format!("/v/{i}")).to_probe_failure(&format!("/v/{i}")))
            .collect();
        let message = BalancerError::PartialProbeFailure { failures }.to_string();

        assert!(message.starts_with("7 item(s) could not be sized"));
        assert!(message.contains("/v/4"));
        assert!(!message.contains("/v/5"));
        assert!(message.ends_with("..."));
    }
}
