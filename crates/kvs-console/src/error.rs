//! Error types for the settings console
//!
//! Covers:
//! - Rejected row operations
//! - Edits addressing fields the console does not have
//! - Transport failures while saving
//! - Configuration and scenario loading

use std::path::PathBuf;

use kvs_group::GroupError;

/// Main console error type
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Row operation rejected by the group
    #[error("group error: {0}")]
    Group(#[from] GroupError),

    /// No group with this id
    #[error("unknown group: {0}")]
    UnknownGroup(String),

    /// No field at this location
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Field cannot be edited
    #[error("field {0} is read-only")]
    ReadOnly(String),

    /// Transport refused the patch
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl ConsoleError {
    /// Check whether the error is a non-fatal rejection the user can act on
    #[inline]
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Group(e) if e.is_capacity()) || matches!(self, Self::ReadOnly(_))
    }
}

/// Failure reported by a [`Transport`](crate::Transport)
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create from a message
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Invalid TOML
    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid YAML
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Extension is neither toml nor yaml
    #[error("unsupported config format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Log filter directive does not parse
    #[error("invalid log filter {filter:?}: {reason}")]
    LogFilter {
        /// Offending directive
        filter: String,
        /// Parser message
        reason: String,
    },
}

/// Scenario replay errors
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Scenario path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Invalid JSON
    #[error("invalid json scenario: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid YAML
    #[error("invalid yaml scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Layout references a catalog or option that makes no sense
    #[error("invalid layout: {0}")]
    Layout(String),

    /// A step failed fatally
    #[error("step {step} failed: {source}")]
    Step {
        /// Zero-based step number
        step: usize,
        /// Console error
        source: ConsoleError,
    },
}

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
