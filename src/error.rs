//! Error types for tstamp
//!
//! This module defines all error types used by the sender, the receiver
//! and the report tooling.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for tstamp operations
#[derive(Error, Debug)]
pub enum TimestampError {
    /// I/O error on a named file
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// File being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the message stream
    #[error("Stream error: {0}")]
    Stream(#[source] std::io::Error),

    /// Peer connection could not be established
    #[error("Connection error to '{addr}': {message}")]
    ConnectionError {
        /// Peer address
        addr: String,
        /// What went wrong
        message: String,
    },

    /// Stream preamble did not match
    #[error("Invalid protocol magic: {0:02x?}")]
    BadMagic([u8; 8]),

    /// Unknown frame type byte
    #[error("Unknown frame type: {0:#04x}")]
    UnknownFrame(u8),

    /// Stream ended in the middle of a frame
    #[error("Truncated frame: {0}")]
    Truncated(&'static str),

    /// Frame decoded but carries an invalid value
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Report parsing error
    #[error("Report error at line {line}: {message}")]
    ReportError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Summary serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TimestampError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectionError {
            addr: addr.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a report parsing error
    pub fn report(line: usize, message: impl Into<String>) -> Self {
        Self::ReportError {
            line,
            message: message.into(),
        }
    }

    /// Check if this error is a wire protocol violation
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::BadMagic(_) | Self::UnknownFrame(_) | Self::Truncated(_) | Self::MalformedFrame(_)
        )
    }
}

/// Result type alias for tstamp operations
pub type Result<T> = std::result::Result<T, TimestampError>;

impl From<std::io::Error> for TimestampError {
    fn from(err: std::io::Error) -> Self {
        TimestampError::Stream(err)
    }
}

impl From<serde_json::Error> for TimestampError {
    fn from(err: serde_json::Error) -> Self {
        TimestampError::Serialization(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| TimestampError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = TimestampError::io("/tmp/tsLog.csv", io_err);
        assert!(matches!(err, TimestampError::Io { ref path, .. } if path == &PathBuf::from("/tmp/tsLog.csv")));
        assert!(err.to_string().contains("tsLog.csv"));
    }

    #[test]
    fn test_with_path_extension() {
        let res: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        let err = res.with_path("/report.csv").unwrap_err();
        assert!(matches!(err, TimestampError::Io { .. }));
    }

    #[test]
    fn test_protocol_error_classification() {
        assert!(TimestampError::UnknownFrame(7).is_protocol_error());
        assert!(TimestampError::Truncated("stamp header").is_protocol_error());
        assert!(!TimestampError::config("bad").is_protocol_error());

        let stream: TimestampError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(!stream.is_protocol_error());
        assert!(matches!(stream, TimestampError::Stream(_)));
    }
}
