//! Subscriber setup for processes that embed the bridge.

use keybridge_core::{LogFormat, LoggingConfig};
use tracing_subscriber::{EnvFilter, filter::ParseError};

/// Errors that can occur while installing the log subscriber.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoggingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log level `{level}`: {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseError,
    },
}

/// Installs a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `Ok(false)` if a
/// global subscriber was already set, by this function or by anyone else, so
/// it is safe to call more than once.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidLevel`] if `RUST_LOG` is unset and
/// `config.level` does not parse.
pub fn init_logging(config: &LoggingConfig) -> Result<bool, LoggingError> {
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else {
        EnvFilter::try_new(&config.level).map_err(|source| LoggingError::InvalidLevel {
            level: config.level.clone(),
            source,
        })?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    Ok(installed.is_ok())
}
