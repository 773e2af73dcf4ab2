#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Logging setup for blocksig.
//!
//! The command-line flags `-v` (repeatable) and `-q` select a [`Verbosity`],
//! which becomes the default directive of a [`tracing_subscriber::EnvFilter`].
//! [`init_tracing`] installs a `fmt` subscriber writing to stderr so that
//! stdout carries only the signature.
//!
//! The `BLOCKSIG_LOG` environment variable replaces the directive when set,
//! e.g. `BLOCKSIG_LOG=blocksig::pool=trace`.

mod config;
mod tracing_bridge;
mod verbosity;

pub use config::{LOG_ENV_VAR, LogConfig};
pub use tracing_bridge::{LoggingError, init_tracing};
pub use verbosity::Verbosity;
