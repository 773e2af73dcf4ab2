//! crates/signature/src/file.rs
//!
//! Aggregated file signature container.

use std::io;

use crate::block::SignatureBlock;
use crate::layout::SignatureLayout;
use crate::output::SignatureWriter;

/// Ordered block digests for one file.
///
/// Holds exactly one [`SignatureBlock`] per block of the layout, in index
/// order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileSignature {
    layout: SignatureLayout,
    blocks: Vec<SignatureBlock>,
}

impl FileSignature {
    /// Pairs every digest with its index and length from `layout`.
    pub(crate) fn from_digests(layout: SignatureLayout, digests: Vec<Vec<u8>>) -> Self {
        let blocks = layout
            .block_lengths()
            .zip(digests)
            .zip(0u64..)
            .map(|((len, digest), index)| SignatureBlock::new(index, len, digest))
            .collect();
        Self { layout, blocks }
    }

    /// Creates a signature from raw components.
    #[must_use]
    pub const fn from_raw_parts(layout: SignatureLayout, blocks: Vec<SignatureBlock>) -> Self {
        Self { layout, blocks }
    }

    /// Returns the layout used to generate the signature.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> SignatureLayout {
        self.layout
    }

    /// Returns the list of block entries in file order.
    #[inline]
    #[must_use]
    pub fn blocks(&self) -> &[SignatureBlock] {
        &self.blocks
    }

    /// Returns the block at `index`.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<&SignatureBlock> {
        usize::try_from(index).ok().and_then(|i| self.blocks.get(i))
    }

    /// Number of blocks in the signature.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Reports whether the signature holds no blocks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterates over the blocks in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, SignatureBlock> {
        self.blocks.iter()
    }

    /// Returns the total number of file bytes covered by the signature.
    #[inline]
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.blocks.iter().map(|block| block.len() as u64).sum()
    }

    /// Sends every block to `writer` in ascending index order, then finishes it.
    ///
    /// # Errors
    ///
    /// Propagates the first failure reported by `writer`.
    pub fn write_to<W: SignatureWriter + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        for block in &self.blocks {
            writer.write_block(block.index(), block.digest())?;
        }
        writer.finish()
    }
}

impl<'a> IntoIterator for &'a FileSignature {
    type Item = &'a SignatureBlock;
    type IntoIter = std::slice::Iter<'a, SignatureBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}
