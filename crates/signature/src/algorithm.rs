//! crates/signature/src/algorithm.rs
//!
//! Digest functions applied to each block.

use std::fmt;

use checksums::{ChecksumAlgorithm, ChecksumError};
use thiserror::Error;

/// Failure reported by a [`BlockHasher`].
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct HashError {
    message: String,
}

impl HashError {
    /// Creates an error carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Maps the bytes of one block to a fixed-size digest.
///
/// Implementations are shared by every hash worker, so they must be callable
/// concurrently from several threads.
pub trait BlockHasher: Send + Sync {
    /// Width of every digest produced by [`hash`](Self::hash), in bytes.
    fn digest_len(&self) -> usize;

    /// Hashes `data`.
    ///
    /// # Errors
    ///
    /// Returns a [`HashError`] when the digest cannot be produced.
    fn hash(&self, data: &[u8]) -> Result<Vec<u8>, HashError>;
}

impl<H: BlockHasher + ?Sized> BlockHasher for &H {
    fn digest_len(&self) -> usize {
        (**self).digest_len()
    }

    fn hash(&self, data: &[u8]) -> Result<Vec<u8>, HashError> {
        (**self).hash(data)
    }
}

/// Strong checksum used for block signatures.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct SignatureAlgorithm {
    checksum: ChecksumAlgorithm,
}

impl SignatureAlgorithm {
    /// SHA-256, the default.
    pub const SHA256: Self = Self::new(ChecksumAlgorithm::Sha256);

    /// Wraps a checksum algorithm.
    #[must_use]
    pub const fn new(checksum: ChecksumAlgorithm) -> Self {
        Self { checksum }
    }

    /// Looks up an algorithm by its user-facing name (`sha256`, `md5`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`ChecksumError::UnknownAlgorithm`] for unrecognised names.
    pub fn from_name(name: &str) -> Result<Self, ChecksumError> {
        name.parse().map(Self::new)
    }

    /// Returns the underlying checksum algorithm.
    #[inline]
    #[must_use]
    pub const fn checksum(self) -> ChecksumAlgorithm {
        self.checksum
    }

    /// Returns the full digest width produced by the algorithm in bytes.
    #[inline]
    #[must_use]
    pub const fn digest_len(self) -> usize {
        self.checksum.digest_len()
    }

    /// Computes a digest for `data`, returning the full-length output.
    #[must_use]
    pub fn compute_full(self, data: &[u8]) -> Vec<u8> {
        self.checksum.compute(data)
    }
}

impl From<ChecksumAlgorithm> for SignatureAlgorithm {
    fn from(checksum: ChecksumAlgorithm) -> Self {
        Self::new(checksum)
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.checksum, f)
    }
}

impl BlockHasher for SignatureAlgorithm {
    fn digest_len(&self) -> usize {
        Self::digest_len(*self)
    }

    fn hash(&self, data: &[u8]) -> Result<Vec<u8>, HashError> {
        Ok(self.compute_full(data))
    }
}
