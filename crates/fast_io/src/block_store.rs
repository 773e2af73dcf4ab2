//! crates/fast_io/src/block_store.rs
//!
//! One-shot allocation of the fixed-capacity block buffers.
//!
//! The store allocates up to the requested number of buffers, consulting the
//! [`SystemProbe`] before each allocation. Allocation stops early, without
//! failing, once available memory minus the reserve no longer covers one more
//! block or once the allocator refuses a request. Only the first buffer is
//! mandatory.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::error::PoolError;
use crate::system::SystemProbe;

/// Smallest block length accepted by the store, in bytes.
pub const MIN_BLOCK_LENGTH: usize = 1024;

/// Memory kept free for the rest of the process while sizing the pool, in MiB.
pub const DEFAULT_MEMORY_RESERVE_MIB: u64 = 100;

const BYTES_PER_MIB: u64 = 1024 * 1024;

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

/// A fixed-capacity byte region tied to one pool slot.
///
/// The buffer remembers which slot and which store it came from, so the pool
/// can reject buffers that do not belong to it. Capacity never changes after
/// allocation; `valid_len` marks how many leading bytes hold block data.
#[derive(Debug)]
pub struct BlockBuffer {
    store_id: u64,
    slot: usize,
    data: Box<[u8]>,
    valid_len: usize,
}

impl BlockBuffer {
    fn try_allocate(store_id: u64, slot: usize, length: usize) -> Option<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(length).ok()?;
        data.resize(length, 0);

        Some(Self {
            store_id,
            slot,
            data: data.into_boxed_slice(),
            valid_len: 0,
        })
    }

    /// Index of the pool slot this buffer belongs to.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Fixed capacity in bytes.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of leading bytes that hold block data.
    #[inline]
    #[must_use]
    pub const fn valid_len(&self) -> usize {
        self.valid_len
    }

    /// The valid prefix of the buffer.
    #[inline]
    #[must_use]
    pub fn valid(&self) -> &[u8] {
        &self.data[..self.valid_len]
    }

    /// Mutable view of the first `length` bytes, for filling with block data.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::LengthExceedsCapacity`] when `length` is larger
    /// than the buffer.
    pub fn writable(&mut self, length: usize) -> Result<&mut [u8], PoolError> {
        let capacity = self.capacity();
        self.data
            .get_mut(..length)
            .ok_or(PoolError::LengthExceedsCapacity { length, capacity })
    }

    #[inline]
    pub(crate) const fn store_id(&self) -> u64 {
        self.store_id
    }

    #[inline]
    pub(crate) const fn set_valid_len(&mut self, length: usize) {
        self.valid_len = length;
    }
}

/// The buffers allocated for one pipeline run.
#[derive(Debug)]
pub struct BlockStore {
    id: u64,
    block_length: usize,
    requested: usize,
    buffers: Vec<BlockBuffer>,
}

impl BlockStore {
    /// Allocates up to `desired` buffers of `block_length` bytes.
    ///
    /// Before each buffer the probe is asked for available memory; allocation
    /// stops once `available - reserve_mib` is smaller than one block. An
    /// allocator refusal also stops allocation. The first buffer is always
    /// attempted regardless of the memory check.
    ///
    /// # Errors
    ///
    /// - [`PoolError::BlockLengthTooSmall`] when `block_length` is below
    ///   [`MIN_BLOCK_LENGTH`].
    /// - [`PoolError::EmptyPool`] when `desired` is zero.
    /// - [`PoolError::AllocationFailed`] when the first buffer cannot be
    ///   allocated.
    pub fn allocate<P: SystemProbe + ?Sized>(
        block_length: usize,
        desired: usize,
        probe: &P,
        reserve_mib: u64,
    ) -> Result<Self, PoolError> {
        if block_length < MIN_BLOCK_LENGTH {
            return Err(PoolError::BlockLengthTooSmall {
                length: block_length,
                minimum: MIN_BLOCK_LENGTH,
            });
        }
        if desired == 0 {
            return Err(PoolError::EmptyPool);
        }

        let id = NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed);
        let mut buffers = Vec::with_capacity(desired);

        for slot in 0..desired {
            if slot > 0 {
                let available = probe.available_memory_mib();
                if !has_headroom(available, block_length, reserve_mib) {
                    warn!(
                        target: "blocksig::pool",
                        allocated = slot,
                        desired,
                        available_mib = available,
                        reserve_mib,
                        "memory reserve reached; capping block pool"
                    );
                    break;
                }
            }

            match BlockBuffer::try_allocate(id, slot, block_length) {
                Some(buffer) => buffers.push(buffer),
                None if slot == 0 => {
                    return Err(PoolError::AllocationFailed {
                        length: block_length,
                    });
                }
                None => {
                    warn!(
                        target: "blocksig::pool",
                        allocated = slot,
                        desired,
                        "allocator refused block buffer; capping block pool"
                    );
                    break;
                }
            }
        }

        debug!(
            target: "blocksig::pool",
            buffers = buffers.len(),
            desired,
            block_length,
            "block store allocated"
        );

        Ok(Self {
            id,
            block_length,
            requested: desired,
            buffers,
        })
    }

    /// Number of buffers actually allocated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Always `false` for a successfully allocated store.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Capacity of every buffer in bytes.
    #[inline]
    #[must_use]
    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    /// Number of buffers originally requested.
    #[inline]
    #[must_use]
    pub const fn requested(&self) -> usize {
        self.requested
    }

    /// Whether memory pressure produced fewer buffers than requested.
    #[inline]
    #[must_use]
    pub fn was_capped(&self) -> bool {
        self.buffers.len() < self.requested
    }

    pub(crate) const fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn into_buffers(self) -> Vec<BlockBuffer> {
        self.buffers
    }
}

fn has_headroom(available_mib: u64, block_length: usize, reserve_mib: u64) -> bool {
    let spare = available_mib
        .saturating_sub(reserve_mib)
        .saturating_mul(BYTES_PER_MIB);
    spare >= block_length as u64
}
