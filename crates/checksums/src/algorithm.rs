//! crates/checksums/src/algorithm.rs
//!
//! Named strong checksum algorithms.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::strong::{Md5, Sha1, Sha256, Sha512, StrongDigest, Xxh3};

/// Errors produced while selecting a checksum algorithm.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ChecksumError {
    /// The requested algorithm name is not recognised.
    #[error("unknown checksum algorithm '{name}' (expected one of: {expected})")]
    UnknownAlgorithm {
        /// Name supplied by the caller.
        name: String,
        /// Comma-separated list of accepted names.
        expected: &'static str,
    },
}

/// Strong checksum algorithms available for block digests.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ChecksumAlgorithm {
    /// SHA-256 (default).
    #[default]
    Sha256,
    /// SHA-512.
    Sha512,
    /// SHA-1.
    Sha1,
    /// MD5.
    Md5,
    /// XXH3/64, non-cryptographic.
    Xxh3,
}

impl ChecksumAlgorithm {
    /// Every supported algorithm, in the order presented to users.
    pub const ALL: [Self; 5] = [Self::Sha256, Self::Sha512, Self::Sha1, Self::Md5, Self::Xxh3];

    const NAMES: &'static str = "sha256, sha512, sha1, md5, xxh3";

    /// Returns the canonical lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Sha1 => "sha1",
            Self::Md5 => "md5",
            Self::Xxh3 => "xxh3",
        }
    }

    /// Returns the digest width in bytes.
    #[inline]
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => Sha256::DIGEST_LEN,
            Self::Sha512 => Sha512::DIGEST_LEN,
            Self::Sha1 => Sha1::DIGEST_LEN,
            Self::Md5 => Md5::DIGEST_LEN,
            Self::Xxh3 => Xxh3::DIGEST_LEN,
        }
    }

    /// Computes the full-width digest of `data`.
    #[must_use]
    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
            Self::Sha1 => Sha1::digest(data).to_vec(),
            Self::Md5 => Md5::digest(data).to_vec(),
            Self::Xxh3 => Xxh3::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = ChecksumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "");
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| ChecksumError::UnknownAlgorithm {
                name: value.to_owned(),
                expected: Self::NAMES,
            })
    }
}
