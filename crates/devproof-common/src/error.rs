//! Unified error types for the devproof workspace.
//!
//! These errors describe *unexpected* failures (unreadable files, malformed
//! JSON, bad configuration). Expected validation failures are never errors:
//! they are recorded in a [`ValidationResult`](crate::types::ValidationResult).

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DevproofError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A document could not be parsed as JSON.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// Path of the malformed document.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DevproofError>;
