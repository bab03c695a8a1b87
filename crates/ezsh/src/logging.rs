//! Logging setup for the shell.
//!
//! The shell installs a `tracing-subscriber` fmt subscriber. `RUST_LOG`, when
//! set, wins over the configured filter.

use tracing_subscriber::EnvFilter;

/// Target names for shell log filtering.
pub mod targets {
    /// Shell host target.
    pub const SHELL: &str = "ezsh::shell";
    /// Menu model target.
    pub const MENU: &str = "ezsh::menu";
    /// Status service target.
    pub const STATUS: &str = "ezsh::status";
}

/// Errors from [`init_logging`].
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("invalid log filter {filter:?}: {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Build the filter: `RUST_LOG` if set and valid, otherwise `default_filter`.
pub fn build_filter(default_filter: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_filter).map_err(|source| LoggingError::InvalidFilter {
        filter: default_filter.to_string(),
        source,
    })
}

/// Install the global fmt subscriber.
///
/// Calling this twice returns [`LoggingError::AlreadyInitialized`].
pub fn init_logging(default_filter: &str) -> Result<(), LoggingError> {
    let filter = build_filter(default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| LoggingError::AlreadyInitialized(err.to_string()))
}
