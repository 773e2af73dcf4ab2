//! crates/signature/src/layout.rs
//!
//! Partitioning of a file into fixed-size sequential blocks.

use core::num::NonZeroU32;

use fast_io::MIN_BLOCK_LENGTH;
use thiserror::Error;

/// Largest number of blocks a single signature may describe.
pub const MAX_BLOCK_COUNT: u64 = i32::MAX as u64;

/// Describes how a file is split into blocks.
///
/// Every block except the last holds exactly [`block_length`](Self::block_length)
/// bytes; the last holds [`last_block_length`](Self::last_block_length) bytes,
/// which is zero only for an empty file. A layout always has at least one block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SignatureLayout {
    block_length: NonZeroU32,
    requested_block_length: NonZeroU32,
    last_block_length: u32,
    block_count: u64,
}

impl SignatureLayout {
    /// Returns the block length in bytes, after shrinking for small files.
    #[inline]
    #[must_use]
    pub const fn block_length(self) -> NonZeroU32 {
        self.block_length
    }

    /// Returns the block length the caller asked for.
    #[inline]
    #[must_use]
    pub const fn requested_block_length(self) -> NonZeroU32 {
        self.requested_block_length
    }

    /// Returns the length of the final block in bytes.
    #[inline]
    #[must_use]
    pub const fn last_block_length(self) -> u32 {
        self.last_block_length
    }

    /// Returns the number of blocks in the layout. Never zero.
    #[inline]
    #[must_use]
    pub const fn block_count(self) -> u64 {
        self.block_count
    }

    /// Block length as a buffer size.
    #[inline]
    #[must_use]
    pub const fn buffer_length(self) -> usize {
        self.block_length.get() as usize
    }

    /// Number of blocks as a collection length.
    ///
    /// Cannot truncate: the count is capped at [`MAX_BLOCK_COUNT`].
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn block_count_usize(self) -> usize {
        self.block_count as usize
    }

    /// Returns the number of bytes block `index` must contain, or `None` when
    /// the index lies outside the layout.
    #[must_use]
    pub const fn expected_len(self, index: u64) -> Option<usize> {
        if index >= self.block_count {
            None
        } else if index + 1 == self.block_count {
            Some(self.last_block_length as usize)
        } else {
            Some(self.buffer_length())
        }
    }

    /// Iterates over the expected length of every block in file order.
    pub fn block_lengths(self) -> impl ExactSizeIterator<Item = usize> {
        (0..self.block_count_usize()).map(move |index| {
            if index + 1 == self.block_count_usize() {
                self.last_block_length as usize
            } else {
                self.buffer_length()
            }
        })
    }

    /// Computes the total file size covered by the layout.
    #[inline]
    #[must_use]
    pub const fn file_size(self) -> u64 {
        (self.block_count - 1) * self.block_length.get() as u64 + self.last_block_length as u64
    }
}

/// Errors produced when calculating signature layouts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SignatureLayoutError {
    /// Block length was zero or below [`MIN_BLOCK_LENGTH`].
    #[error("block length {length} is below the minimum of {minimum} bytes")]
    BlockLengthTooSmall {
        /// Requested block length.
        length: u32,
        /// Minimum accepted block length.
        minimum: u32,
    },
    /// Number of blocks exceeded [`MAX_BLOCK_COUNT`].
    #[error("block count {blocks} derived from block length {block_length} exceeds i32::MAX")]
    BlockCountOverflow {
        /// Block length that triggered the overflow.
        block_length: u32,
        /// Block count implied by the file length.
        blocks: u64,
    },
}

/// Calculates the block layout of a `file_length`-byte file.
///
/// The block count is `max(ceil(file_length / block_length), 1)`, so an empty
/// file still yields one zero-length block. When the file is shorter than one
/// block the block length shrinks to `max(file_length, MIN_BLOCK_LENGTH)`,
/// which keeps the single buffer no larger than needed.
///
/// # Errors
///
/// - [`SignatureLayoutError::BlockLengthTooSmall`] for block lengths below
///   [`MIN_BLOCK_LENGTH`].
/// - [`SignatureLayoutError::BlockCountOverflow`] when more than
///   [`MAX_BLOCK_COUNT`] blocks would be needed.
#[doc(alias = "--block-size")]
#[allow(clippy::cast_possible_truncation)]
pub fn calculate_signature_layout(
    file_length: u64,
    block_length: u32,
) -> Result<SignatureLayout, SignatureLayoutError> {
    const MINIMUM: u32 = MIN_BLOCK_LENGTH as u32;

    let requested = match NonZeroU32::new(block_length) {
        Some(length) if length.get() >= MINIMUM => length,
        _ => {
            return Err(SignatureLayoutError::BlockLengthTooSmall {
                length: block_length,
                minimum: MINIMUM,
            });
        }
    };

    let block_count = file_length.div_ceil(u64::from(block_length)).max(1);
    if block_count > MAX_BLOCK_COUNT {
        return Err(SignatureLayoutError::BlockCountOverflow {
            block_length,
            blocks: block_count,
        });
    }

    // The shrunk length is below the requested one, so it fits in u32.
    let effective = if file_length < u64::from(block_length) {
        NonZeroU32::new((file_length as u32).max(MINIMUM)).unwrap_or(requested)
    } else {
        requested
    };

    let covered = (block_count - 1) * u64::from(effective.get());
    let last_block_length = (file_length - covered) as u32;

    Ok(SignatureLayout {
        block_length: effective,
        requested_block_length: requested,
        last_block_length,
        block_count,
    })
}
