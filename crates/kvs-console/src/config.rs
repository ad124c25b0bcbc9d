//! Console configuration
//!
//! Loaded from TOML or YAML, chosen by file extension. Every key is
//! optional:
//!
//! ```toml
//! remote_policy = "preserve-local"
//! numeric_strings = false
//! cleanup = true
//! log_filter = "info"
//! log_format = "compact"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use kvs_patch::BuildOptions;

use crate::error::ConfigError;

/// What a remote push does to a field the user has edited locally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemotePolicy {
    /// A dirty field keeps its live value; only its baseline moves and its
    /// flag is recomputed. Clean fields take the pushed value.
    #[default]
    PreserveLocal,
    /// The pushed value replaces live value and baseline, discarding the
    /// local edit
    RemoteWins,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Single-line human output
    #[default]
    Compact,
    /// Multi-line human output
    Pretty,
    /// One JSON object per event
    Json,
}

/// Console configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Conflict policy for remote pushes
    pub remote_policy: RemotePolicy,
    /// Send numeric-looking text as numbers
    pub numeric_strings: bool,
    /// Emit deletions for vacated row slots
    pub cleanup: bool,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            remote_policy: RemotePolicy::PreserveLocal,
            numeric_strings: false,
            cleanup: true,
            log_filter: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl ConsoleConfig {
    /// Create default config
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set remote policy
    #[inline]
    #[must_use]
    pub fn with_remote_policy(mut self, policy: RemotePolicy) -> Self {
        self.remote_policy = policy;
        self
    }

    /// Toggle numeric text conversion
    #[inline]
    #[must_use]
    pub fn with_numeric_strings(mut self, enabled: bool) -> Self {
        self.numeric_strings = enabled;
        self
    }

    /// Toggle deletion output
    #[inline]
    #[must_use]
    pub fn with_cleanup(mut self, enabled: bool) -> Self {
        self.cleanup = enabled;
        self
    }

    /// Set default log filter
    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Set log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Patch builder options implied by this config
    #[inline]
    #[must_use]
    pub fn build_options(&self, force_all: bool) -> BuildOptions {
        BuildOptions::new()
            .with_force_all(force_all)
            .with_cleanup(self.cleanup)
            .with_numeric_strings(self.numeric_strings)
    }

    /// Parse TOML text
    ///
    /// # Errors
    ///
    /// [`ConfigError::Toml`] on invalid input.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse YAML text
    ///
    /// # Errors
    ///
    /// [`ConfigError::Yaml`] on invalid input.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a `.toml`, `.yaml` or `.yml` file
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, does not parse, or has another
    /// extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let parse: fn(&str) -> Result<Self, ConfigError> =
            match path.extension().and_then(|e| e.to_str()) {
                Some("toml") => Self::from_toml_str,
                Some("yaml" | "yml") => Self::from_yaml_str,
                _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
            };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = parse(&text)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// Never fails for this struct in practice; the error is propagated from
    /// the serializer.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(ConsoleConfig::from_toml_str("").unwrap(), ConsoleConfig::default());
    }

    #[test]
    fn toml_overrides() {
        let config = ConsoleConfig::from_toml_str(
            "remote_policy = \"remote-wins\"\ncleanup = false\nlog_format = \"json\"\n",
        )
        .unwrap();
        assert_eq!(config.remote_policy, RemotePolicy::RemoteWins);
        assert!(!config.cleanup);
        assert!(!config.numeric_strings);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn yaml_overrides() {
        let config =
            ConsoleConfig::from_yaml_str("numeric_strings: true\nlog_filter: debug\n").unwrap();
        assert!(config.numeric_strings);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.remote_policy, RemotePolicy::PreserveLocal);
    }

    #[test]
    fn toml_round_trip() {
        let config = ConsoleConfig::new()
            .with_remote_policy(RemotePolicy::RemoteWins)
            .with_numeric_strings(true);
        let text = config.to_toml_string().unwrap();
        assert_eq!(ConsoleConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = ConsoleConfig::load(Path::new("console.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn build_options_follow_config() {
        let options = ConsoleConfig::new().with_cleanup(false).build_options(true);
        assert!(options.force_all);
        assert!(!options.cleanup);
    }
}
