//! crates/checksums/src/strong/xxhash.rs
//!
//! XXH3/64 digest backed by `xxhash-rust`.

use super::StrongDigest;

/// Streaming XXH3/64 hasher.
///
/// XXH3 is a non-cryptographic hash. It is offered for fast change detection
/// when collision resistance against an adversary is not required. The
/// digest is emitted big-endian so its hex rendering matches the canonical
/// XXH3 representation.
///
/// # Examples
///
/// ```
/// use checksums::strong::Xxh3;
///
/// let mut hasher = Xxh3::new();
/// hasher.update(b"chunk 1");
/// hasher.update(b"chunk 2");
/// assert_eq!(hasher.finalize(), Xxh3::digest(b"chunk 1chunk 2"));
/// ```
#[derive(Clone)]
pub struct Xxh3 {
    inner: xxhash_rust::xxh3::Xxh3,
}

impl std::fmt::Debug for Xxh3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Xxh3").finish_non_exhaustive()
    }
}

impl Default for Xxh3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Xxh3 {
    /// Creates an unseeded hasher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: xxhash_rust::xxh3::Xxh3::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest.
    #[must_use]
    pub fn finalize(self) -> [u8; 8] {
        self.inner.digest().to_be_bytes()
    }

    /// One-shot digest of `data`.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 8] {
        xxhash_rust::xxh3::xxh3_64(data).to_be_bytes()
    }
}

impl StrongDigest for Xxh3 {
    type Digest = [u8; 8];
    const DIGEST_LEN: usize = 8;

    fn new() -> Self {
        Xxh3::new()
    }

    fn update(&mut self, data: &[u8]) {
        self.update(data);
    }

    fn finalize(self) -> Self::Digest {
        self.finalize()
    }

    fn digest(data: &[u8]) -> Self::Digest {
        Xxh3::digest(data)
    }
}
