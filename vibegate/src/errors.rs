//! Error types for vibegate.
//!
//! Diagnostic findings never surface here: they are carried as
//! [`StageResult`](crate::core::StageResult)s. These types cover
//! configuration, construction and infrastructure failures only.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Convenience result alias used across the crate.
pub type Result<T, E = VibeGateError> = std::result::Result<T, E>;

/// The main error type for vibegate operations.
#[derive(Debug, Error)]
pub enum VibeGateError {
    /// A stage number outside `1..=6` was supplied.
    #[error("Invalid stage number: {0} (expected 1..=6)")]
    InvalidStage(u8),

    /// The gate chain could not be assembled.
    #[error("Chain validation error: {0}")]
    ChainValidation(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source or test tree scan failed.
    #[error("{0}")]
    Scan(#[from] ScanError),

    /// A notification could not be delivered.
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VibeGateError {
    /// Creates a chain validation error.
    #[must_use]
    pub fn chain(message: impl Into<String>) -> Self {
        Self::ChainValidation(message.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Error raised when walking a source or test tree fails.
#[derive(Debug, Clone, Error)]
#[error("Scan failed at '{}': {message}", path.display())]
pub struct ScanError {
    /// The path at which traversal failed.
    pub path: PathBuf,
    /// The underlying error message.
    pub message: String,
}

impl ScanError {
    /// Creates a new scan error.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

impl From<walkdir::Error> for ScanError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        Self {
            path,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_stage_message() {
        let err = VibeGateError::InvalidStage(9);
        assert!(err.to_string().contains("9"));
        assert!(err.to_string().contains("1..=6"));
    }

    #[test]
    fn test_scan_error_display() {
        let err = ScanError::new("/tmp/project/src", "permission denied");
        let text = err.to_string();
        assert!(text.contains("/tmp/project/src"));
        assert!(text.contains("permission denied"));
    }

    #[test]
    fn test_scan_error_converts() {
        let err: VibeGateError = ScanError::new("src", "boom").into();
        assert!(matches!(err, VibeGateError::Scan(_)));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: VibeGateError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
