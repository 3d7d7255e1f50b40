//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error` or `reqwest::Error`. Underlying causes
//! are captured as strings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download operations.
///
/// Variants fall into four families:
/// - request rejection (`InvalidRequest`), returned synchronously with no record created
/// - destination preparation (`Directory`), recorded on the download as Failed
/// - transfer failure (`Http`, `Network`, `Timeout`, `Io`, `Cancelled`, `Scheduling`)
/// - lookup failure (`NotFound`) for unknown or reaped identifiers
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadError {
    /// Missing or empty field, malformed URL, or unknown folder class.
    #[error("{message}")]
    InvalidRequest {
        /// Why the request was rejected.
        message: String,
    },

    /// The destination directory could not be created.
    #[error("Failed to create download directory {path}: {message}")]
    Directory {
        /// Directory that could not be created.
        path: String,
        /// Underlying error message.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("HTTP error {status}: {reason}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Connection or protocol failure.
    #[error("Network error: {message}")]
    Network {
        /// Underlying error message.
        message: String,
    },

    /// A single network operation exceeded its timeout.
    #[error("Timed out: {message}")]
    Timeout {
        /// What timed out.
        message: String,
    },

    /// Filesystem error while writing the destination.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g. "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// The download was cancelled.
    #[error("Download cancelled")]
    Cancelled,

    /// The background transfer could not be scheduled or died unexpectedly.
    #[error("Failed to schedule download: {message}")]
    Scheduling {
        /// Underlying error message.
        message: String,
    },

    /// No record exists for the identifier (never issued, or already reaped).
    #[error("Download not found: {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: String,
    },
}

impl DownloadError {
    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a directory creation error.
    pub fn directory(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Directory {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error.
    pub fn http(status: u16, reason: impl Into<String>) -> Self {
        Self::Http {
            status,
            reason: reason.into(),
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    ///
    /// This captures the error kind name and message for serialization.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        Self::Io {
            kind: format!("{:?}", err.kind()),
            message: err.to_string(),
        }
    }

    /// Create a scheduling error.
    pub fn scheduling(message: impl Into<String>) -> Self {
        Self::Scheduling {
            message: message.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Rejected before any record was created.
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. })
    }

    /// Failure that happened after the download was accepted.
    #[must_use]
    pub const fn is_transfer_failure(&self) -> bool {
        matches!(
            self,
            Self::Directory { .. }
                | Self::Http { .. }
                | Self::Network { .. }
                | Self::Timeout { .. }
                | Self::Io { .. }
                | Self::Cancelled
                | Self::Scheduling { .. }
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Convenience result type for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only fs");
        let err = DownloadError::from_io_error(&io_err);

        match err {
            DownloadError::Io { kind, message } => {
                assert_eq!(kind, "PermissionDenied");
                assert!(message.contains("read-only fs"));
            }
            _ => panic!("Expected Io variant"),
        }
    }

    #[test]
    fn http_error_mentions_status() {
        let err = DownloadError::http(404, "Not Found");
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert!(err.is_transfer_failure());
    }

    #[test]
    fn test_error_serialization() {
        let err = DownloadError::directory("/models/loras", "permission denied");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"type\":\"directory\""));

        let parsed: DownloadError = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn io_error_keeps_its_kind_field() {
        let io_err = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let err = DownloadError::from_io_error(&io_err);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "io");
        assert_eq!(json["kind"], "StorageFull");

        let parsed: DownloadError = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, err);
    }

    #[test]
    fn test_families() {
        assert!(DownloadError::invalid_request("Missing required parameters").is_invalid_request());
        assert!(!DownloadError::invalid_request("x").is_transfer_failure());
        assert!(DownloadError::not_found("abc").is_not_found());
        assert!(DownloadError::Cancelled.is_cancelled());
        assert!(DownloadError::Cancelled.is_transfer_failure());
    }
}
