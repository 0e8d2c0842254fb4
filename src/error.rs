//! Error types for Tabasamu
//!
//! This module defines all error types used throughout the crate. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Administrative paths (package loading, discovery, option storage)
//! propagate these errors so a settings screen can tell a missing package
//! apart from a corrupt one. The content filter never surfaces them.

use thiserror::Error;

/// The primary error type for Tabasamu operations.
#[derive(Error, Debug)]
pub enum TabasamuError {
    /// A package definition file does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A package definition file exists but could not be parsed.
    #[error("Parse error in package '{package}': {message}")]
    Parse {
        /// Name of the package whose definition failed to parse.
        package: String,
        /// What went wrong.
        message: String,
    },

    /// A package name that would resolve outside the packages directory.
    #[error("Invalid package name: {0}")]
    InvalidPackageName(String),

    /// Configuration-related errors (unreadable config, bad option store, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TabasamuError {
    /// Build a parse error for the named package.
    pub fn parse(package: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            package: package.into(),
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for Tabasamu operations.
pub type Result<T> = std::result::Result<T, TabasamuError>;
