//! crates/signature/src/sink.rs
//!
//! Index-addressed collector for block digests.
//!
//! Each index owns a write-once cell, so workers finishing blocks out of order
//! store their digests without coordinating with each other. The collector is
//! drained in index order once every worker has stopped.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

/// Misuse of a [`ResultSink`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SinkError {
    /// The index lies beyond the number of blocks.
    #[error("block index {index} is outside the signature of {len} blocks")]
    IndexOutOfRange {
        /// Offending block index.
        index: u64,
        /// Number of slots in the sink.
        len: usize,
    },
    /// A digest was already stored for the index.
    #[error("digest for block {index} was recorded twice")]
    AlreadyRecorded {
        /// Offending block index.
        index: u64,
    },
    /// Draining found an index without a digest.
    #[error("digest for block {index} is missing")]
    Missing {
        /// First index without a digest.
        index: u64,
    },
}

/// Preallocated digest slots, one per block.
#[derive(Debug)]
pub struct ResultSink {
    slots: Box<[OnceLock<Vec<u8>>]>,
    recorded: AtomicUsize,
}

impl ResultSink {
    /// Creates a sink with `len` empty slots.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
            recorded: AtomicUsize::new(0),
        }
    }

    /// Stores the digest of block `index`.
    ///
    /// # Errors
    ///
    /// - [`SinkError::IndexOutOfRange`] for indices past the end.
    /// - [`SinkError::AlreadyRecorded`] when the slot is already filled.
    pub fn set(&self, index: u64, digest: Vec<u8>) -> Result<(), SinkError> {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| self.slots.get(i))
            .ok_or(SinkError::IndexOutOfRange {
                index,
                len: self.slots.len(),
            })?;

        slot.set(digest)
            .map_err(|_| SinkError::AlreadyRecorded { index })?;
        self.recorded.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Returns the digest stored for `index`, if any.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<&[u8]> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.slots.get(i))
            .and_then(OnceLock::get)
            .map(Vec::as_slice)
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether the sink has no slots.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a digest.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded.load(Ordering::Acquire)
    }

    /// Reports whether every slot holds a digest.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.recorded() == self.slots.len()
    }

    /// Consumes the sink, returning the digests in index order.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Missing`] naming the first empty slot.
    pub fn into_digests(self) -> Result<Vec<Vec<u8>>, SinkError> {
        self.slots
            .into_vec()
            .into_iter()
            .zip(0u64..)
            .map(|(mut slot, index)| slot.take().ok_or(SinkError::Missing { index }))
            .collect()
    }
}
