use thiserror::Error;

/// Errors raised by the block store and slot pool.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum PoolError {
    /// Requested block length is below the supported minimum.
    #[error("block length {length} is below the minimum of {minimum} bytes")]
    BlockLengthTooSmall {
        /// Requested block length in bytes.
        length: usize,
        /// Minimum accepted block length in bytes.
        minimum: usize,
    },
    /// A pool with zero buffers was requested.
    #[error("block pool must hold at least one buffer")]
    EmptyPool,
    /// Not even the first, mandatory buffer could be allocated.
    #[error("failed to allocate a {length}-byte block buffer")]
    AllocationFailed {
        /// Size of the buffer that could not be allocated.
        length: usize,
    },
    /// The buffer was not handed out by this pool.
    #[error("buffer for slot {slot} does not belong to this pool")]
    ForeignBuffer {
        /// Slot index carried by the buffer.
        slot: usize,
    },
    /// The slot is not currently claimed, so the transition is invalid.
    #[error("slot {slot} is not claimed")]
    SlotNotClaimed {
        /// Slot index carried by the buffer.
        slot: usize,
    },
    /// A valid length larger than the buffer capacity was supplied.
    #[error("length {length} exceeds buffer capacity of {capacity} bytes")]
    LengthExceedsCapacity {
        /// Requested valid length.
        length: usize,
        /// Fixed buffer capacity.
        capacity: usize,
    },
}
