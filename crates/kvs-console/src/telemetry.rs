//! Tracing setup for the console binary

use tracing_subscriber::EnvFilter;

use crate::config::{ConsoleConfig, LogFormat};
use crate::error::ConfigError;

/// Install the global subscriber
///
/// `RUST_LOG` wins over the configured filter. Logs go to stderr so stdout
/// stays free for wire requests. Installing twice is a no-op.
///
/// # Errors
///
/// [`ConfigError::LogFilter`] when the configured filter does not parse.
pub fn init(config: &ConsoleConfig) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_filter).map_err(|e| ConfigError::LogFilter {
            filter: config.log_filter.clone(),
            reason: e.to_string(),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let installed = match config.log_format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
    Ok(())
}
