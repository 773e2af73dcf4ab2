//! crates/signature/src/error.rs
//!
//! Failures of the signature pipeline.

use std::io;

use fast_io::PoolError;
use thiserror::Error;

use crate::algorithm::HashError;
use crate::layout::SignatureLayoutError;
use crate::sink::SinkError;

/// Exit code for usage and configuration errors.
pub const EXIT_SYNTAX: i32 = 1;
/// Exit code for errors selecting or inspecting the input file.
pub const EXIT_FILE_SELECT: i32 = 3;
/// Exit code for I/O errors while reading the input.
pub const EXIT_FILE_IO: i32 = 11;
/// Exit code for hashing and worker failures.
pub const EXIT_WORKER: i32 = 12;
/// Exit code for buffer allocation failures.
pub const EXIT_ALLOCATION: i32 = 22;
/// Exit code for failures writing the signature.
pub const EXIT_OUTPUT: i32 = 23;

/// Errors returned when generating file signatures.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The input length could not be determined.
    #[error("failed to stat {name}: {source}")]
    Stat {
        /// Display name of the input.
        name: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The input could not be opened for reading.
    #[error("failed to open {name}: {source}")]
    Open {
        /// Display name of the input.
        name: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The block layout is invalid for this input.
    #[error(transparent)]
    Layout(#[from] SignatureLayoutError),
    /// The block pool could not be created or was misused.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Reading a block failed.
    #[error("failed to read block {index}: {source}")]
    Read {
        /// Block being read.
        index: u64,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The input ended before the block was complete.
    #[error("input ended inside block {index}: expected {expected} byte(s), read {actual}")]
    ShortRead {
        /// Block being read.
        index: u64,
        /// Bytes the layout requires for the block.
        expected: usize,
        /// Bytes obtained before end of input.
        actual: usize,
    },
    /// Data was present past the length measured at start.
    #[error("input grew past the expected length of {expected} bytes")]
    TrailingData {
        /// Length measured before reading.
        expected: u64,
    },
    /// The digest function failed.
    #[error("failed to hash block {index}: {source}")]
    Hash {
        /// Block being hashed.
        index: u64,
        /// Underlying failure.
        #[source]
        source: HashError,
    },
    /// The digest function panicked.
    #[error("hash worker panicked on block {index}: {message}")]
    WorkerPanicked {
        /// Block being hashed.
        index: u64,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// A pipeline thread panicked outside the digest function.
    #[error("thread {name} panicked: {message}")]
    ThreadPanicked {
        /// Thread name.
        name: &'static str,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// The digest collector rejected a digest or was incomplete.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// The hash worker pool could not be started.
    #[error("failed to build hash worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    /// A pipeline thread could not be spawned.
    #[error("failed to spawn thread {name}: {source}")]
    ThreadSpawn {
        /// Thread name.
        name: &'static str,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The pipeline stopped without a recorded cause.
    #[error("signature generation was cancelled")]
    Cancelled,
}

impl SignatureError {
    /// Process exit code reported for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Layout(SignatureLayoutError::BlockLengthTooSmall { .. })
            | Self::Pool(PoolError::BlockLengthTooSmall { .. } | PoolError::EmptyPool) => {
                EXIT_SYNTAX
            }
            Self::Stat { .. }
            | Self::Open { .. }
            | Self::Layout(SignatureLayoutError::BlockCountOverflow { .. }) => EXIT_FILE_SELECT,
            Self::Read { .. } | Self::ShortRead { .. } | Self::TrailingData { .. } => EXIT_FILE_IO,
            Self::Pool(PoolError::AllocationFailed { .. }) => EXIT_ALLOCATION,
            Self::Pool(_)
            | Self::Hash { .. }
            | Self::WorkerPanicked { .. }
            | Self::ThreadPanicked { .. }
            | Self::Sink(_)
            | Self::WorkerPool(_)
            | Self::ThreadSpawn { .. }
            | Self::Cancelled => EXIT_WORKER,
        }
    }
}

/// Renders a panic payload for error reporting.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_class() {
        let too_small = SignatureError::Layout(SignatureLayoutError::BlockLengthTooSmall {
            length: 1,
            minimum: 1024,
        });
        assert_eq!(too_small.exit_code(), EXIT_SYNTAX);

        let stat = SignatureError::Stat {
            name: "missing".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(stat.exit_code(), EXIT_FILE_SELECT);

        let short = SignatureError::ShortRead {
            index: 3,
            expected: 1024,
            actual: 10,
        };
        assert_eq!(short.exit_code(), EXIT_FILE_IO);

        let alloc = SignatureError::Pool(PoolError::AllocationFailed { length: 1 << 30 });
        assert_eq!(alloc.exit_code(), EXIT_ALLOCATION);

        let hash = SignatureError::Hash {
            index: 0,
            source: HashError::new("boom"),
        };
        assert_eq!(hash.exit_code(), EXIT_WORKER);
    }

    #[test]
    fn short_read_message_names_block() {
        let message = SignatureError::ShortRead {
            index: 7,
            expected: 4096,
            actual: 12,
        }
        .to_string();
        assert!(message.contains("block 7"));
        assert!(message.contains("4096"));
    }

    #[test]
    fn panic_message_extracts_strings() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(payload.as_ref()), "static");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn std::any::Any + Send> = Box::new(17_u32);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
