#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the strong digests applied to every block of a file
//! signature. Each algorithm is exposed as a streaming hasher implementing
//! [`strong::StrongDigest`], plus a one-shot `digest` helper used by the
//! signature workers.
//!
//! # Design
//!
//! Hashers wrap the RustCrypto implementations (`sha2`, `sha1`, `md-5`) and
//! `xxhash-rust` for XXH3. The [`ChecksumAlgorithm`] enum names the supported
//! algorithms and owns the mapping from command-line spellings.
//!
//! # Examples
//!
//! ```
//! use checksums::ChecksumAlgorithm;
//!
//! let algorithm: ChecksumAlgorithm = "sha256".parse().unwrap();
//! assert_eq!(algorithm.digest_len(), 32);
//! assert_eq!(algorithm.compute(b"").len(), 32);
//! ```

mod algorithm;
pub mod strong;

pub use algorithm::{ChecksumAlgorithm, ChecksumError};
