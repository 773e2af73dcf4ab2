//! crates/signature/src/block.rs
//!
//! Individual signature block representation.

/// Describes a single block within a file signature.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignatureBlock {
    index: u64,
    len: usize,
    digest: Vec<u8>,
}

impl SignatureBlock {
    /// Creates a new block descriptor.
    pub(crate) const fn new(index: u64, len: usize, digest: Vec<u8>) -> Self {
        Self { index, len, digest }
    }

    /// Creates a block descriptor from raw components.
    #[must_use]
    pub const fn from_raw_parts(index: u64, len: usize, digest: Vec<u8>) -> Self {
        Self::new(index, len, digest)
    }

    /// Returns the zero-based index of the block within the signature.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// Returns the digest bytes for the block.
    #[inline]
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Returns the digest rendered as uppercase hexadecimal.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode_upper(&self.digest)
    }

    /// Returns the number of file bytes that were hashed.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Reports whether the block corresponds to an empty range.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_parts() {
        let digest = vec![0xAB, 0x01, 0xFF];
        let block = SignatureBlock::from_raw_parts(42, 4096, digest.clone());
        assert_eq!(block.index(), 42);
        assert_eq!(block.len(), 4096);
        assert_eq!(block.digest(), &digest);
    }

    #[test]
    fn digest_hex_is_uppercase_without_separators() {
        let block = SignatureBlock::from_raw_parts(0, 1, vec![0xab, 0x01, 0xff]);
        assert_eq!(block.digest_hex(), "AB01FF");
    }

    #[test]
    fn empty_block() {
        let block = SignatureBlock::from_raw_parts(0, 0, vec![0; 32]);
        assert!(block.is_empty());
    }
}
