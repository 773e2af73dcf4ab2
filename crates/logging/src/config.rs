//! crates/logging/src/config.rs
//! Subscriber configuration derived from command-line flags.

use std::env;

use tracing_subscriber::EnvFilter;

use crate::tracing_bridge::LoggingError;
use crate::verbosity::Verbosity;

/// Environment variable that replaces the verbosity-derived directive.
pub const LOG_ENV_VAR: &str = "BLOCKSIG_LOG";

/// Settings for [`init_tracing`](crate::init_tracing).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LogConfig {
    /// Default level when no override is present.
    pub verbosity: Verbosity,
    /// Emit ANSI colour codes.
    pub ansi: bool,
    /// Include thread names (`blocksig-reader`, `blocksig-hash-N`, ...).
    pub thread_names: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            ansi: false,
            thread_names: true,
        }
    }
}

impl LogConfig {
    /// Configuration for `verbosity` with other settings at their defaults.
    #[must_use]
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    /// Enables or disables ANSI colour codes.
    #[must_use]
    pub const fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Builds the filter, honouring [`LOG_ENV_VAR`] when set.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError::InvalidDirective`] when the override does not
    /// parse.
    pub fn filter(&self) -> Result<EnvFilter, LoggingError> {
        let override_directive = env::var(LOG_ENV_VAR).ok();
        self.filter_with_override(override_directive.as_deref())
    }

    /// Builds the filter from an explicit override instead of the environment.
    ///
    /// # Errors
    ///
    /// Returns [`LoggingError::InvalidDirective`] when `directive` does not
    /// parse.
    pub fn filter_with_override(&self, directive: Option<&str>) -> Result<EnvFilter, LoggingError> {
        match directive.map(str::trim).filter(|d| !d.is_empty()) {
            Some(directive) => {
                EnvFilter::try_new(directive).map_err(|source| LoggingError::InvalidDirective {
                    directive: directive.to_owned(),
                    source,
                })
            }
            None => Ok(EnvFilter::new(self.verbosity.directive())),
        }
    }
}
