//! crates/checksums/src/strong/mod.rs
//!
//! Streaming strong digests.

mod md5;
mod sha;
mod xxhash;

pub use md5::Md5;
pub use sha::{Sha1, Sha256, Sha512};
pub use xxhash::Xxh3;

/// Common interface implemented by every strong digest.
///
/// The trait mirrors the RustCrypto `Digest` flow (create, update, finalize)
/// while fixing the output type so callers can size buffers statically.
pub trait StrongDigest: Sized {
    /// Fixed-size output produced by [`finalize`](Self::finalize).
    type Digest: AsRef<[u8]> + Copy + Eq + std::fmt::Debug;

    /// Width of the digest in bytes.
    const DIGEST_LEN: usize;

    /// Creates a hasher with an empty state.
    fn new() -> Self;

    /// Feeds additional bytes into the digest state.
    fn update(&mut self, data: &[u8]);

    /// Finalises the digest.
    fn finalize(self) -> Self::Digest;

    /// Computes the digest of `data` in one shot.
    fn digest(data: &[u8]) -> Self::Digest {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}

#[cfg(test)]
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
