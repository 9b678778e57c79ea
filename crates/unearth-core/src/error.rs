//! Error types for scanning operations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scan-level failures. Per-entry problems are [`ScanWarning`]s instead.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan was cancelled before it finished.
    #[error("Scan cancelled")]
    Cancelled,

    /// The consumer stopped receiving events.
    #[error("Event receiver was dropped")]
    Delivery,

    /// A background worker panicked or was aborted.
    #[error("Scan worker failed: {message}")]
    Worker { message: String },
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Symbolic link target does not exist.
    BrokenSymlink,
    /// Error reading a directory listing.
    ReadError,
    /// Error reading metadata.
    MetadataError,
    /// File exists but cannot be opened for reading.
    Unreadable,
}

/// Non-fatal warning encountered during a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning from an I/O error, picking the kind from the error.
    pub fn from_io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = match error.kind() {
            std::io::ErrorKind::PermissionDenied => WarningKind::PermissionDenied,
            std::io::ErrorKind::NotFound => WarningKind::BrokenSymlink,
            _ => WarningKind::ReadError,
        };
        Self {
            message: format!("{error}"),
            path,
            kind,
        }
    }

    /// Create an unreadable-file warning.
    pub fn unreadable(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            message: format!("Unreadable: {}", path.display()),
            path,
            kind: WarningKind::Unreadable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_messages() {
        assert_eq!(ScanError::Cancelled.to_string(), "Scan cancelled");
        let err = ScanError::Worker {
            message: "panicked".into(),
        };
        assert_eq!(err.to_string(), "Scan worker failed: panicked");
    }

    #[test]
    fn test_warning_from_io_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let warning = ScanWarning::from_io("/test/link", &err);
        assert_eq!(warning.kind, WarningKind::BrokenSymlink);

        let warning = ScanWarning::unreadable("/test/secret");
        assert_eq!(warning.kind, WarningKind::Unreadable);
        assert!(warning.message.contains("/test/secret"));
    }
}
