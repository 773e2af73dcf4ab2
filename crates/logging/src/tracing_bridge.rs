//! crates/logging/src/tracing_bridge.rs
//! Installation of the global tracing subscriber.

use std::io;

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

use crate::config::LogConfig;

/// Errors raised while configuring logging.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log directive '{directive}': {source}")]
    InvalidDirective {
        /// Directive as supplied.
        directive: String,
        /// Parser failure.
        #[source]
        source: ParseError,
    },
    /// A global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Installs a stderr `fmt` subscriber filtered according to `config`.
///
/// Events carry their target and, when enabled, the emitting thread's name.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidDirective`] for a malformed override and
/// [`LoggingError::Install`] when a global subscriber already exists.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{LogConfig, Verbosity, init_tracing};
///
/// init_tracing(&LogConfig::new(Verbosity::Verbose))?;
/// tracing::info!(target: "blocksig::pipeline", "ready");
/// ```
pub fn init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let filter = config.filter()?;
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.ansi)
        .with_target(true)
        .with_thread_names(config.thread_names);

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}
