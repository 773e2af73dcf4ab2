//! crates/signature/src/queue.rs
//!
//! Hand-off of filled blocks from the reader to the hash workers.
//!
//! The queue couples the [`BlockPool`] (free buffers) with a FIFO of published
//! blocks. The producer and consumer see it through separate traits so each
//! side can only perform its own transitions:
//!
//! ```text
//!  reader: claim_free_buffer ──▶ publish ──┐
//!                                          ▼  FIFO
//!  worker:        mark_processed ◀── take_next
//! ```

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use fast_io::{BlockBuffer, BlockPool, PoolError};

/// A filled buffer tagged with its position in the file.
#[derive(Debug)]
pub struct SequencedBlock {
    index: u64,
    buffer: BlockBuffer,
}

impl SequencedBlock {
    /// Zero-based block index.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// The block's bytes.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.buffer.valid()
    }

    /// Pool slot holding the bytes.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.buffer.slot()
    }

    fn into_buffer(self) -> BlockBuffer {
        self.buffer
    }
}

/// Producer side of a [`BlockQueue`].
pub trait WritableBlockQueue: Sync {
    /// Claims a free buffer without waiting.
    fn try_claim_free_buffer(&self) -> Option<BlockBuffer>;

    /// Claims a free buffer, waiting at most `timeout`.
    fn claim_free_buffer(&self, timeout: Duration) -> Option<BlockBuffer>;

    /// Publishes the first `valid_len` bytes of `buffer` as block `index`.
    ///
    /// # Errors
    ///
    /// Returns the pool's rejection; the buffer is returned to the pool.
    fn publish(&self, index: u64, buffer: BlockBuffer, valid_len: usize) -> Result<(), PoolError>;

    /// Returns a claimed buffer that will not be published.
    ///
    /// # Errors
    ///
    /// Returns the pool's rejection of the buffer.
    fn discard(&self, buffer: BlockBuffer) -> Result<(), PoolError>;
}

/// Consumer side of a [`BlockQueue`].
pub trait ReadableBlockQueue: Sync {
    /// Takes the oldest published block without waiting.
    fn try_take_next(&self) -> Option<SequencedBlock>;

    /// Takes the oldest published block, waiting at most `timeout`.
    fn take_next(&self, timeout: Duration) -> Option<SequencedBlock>;

    /// Returns a hashed block's buffer to the pool.
    ///
    /// # Errors
    ///
    /// Returns the pool's rejection of the buffer.
    fn mark_processed(&self, block: SequencedBlock) -> Result<(), PoolError>;
}

/// Block pool plus FIFO of published blocks.
#[derive(Debug)]
pub struct BlockQueue {
    pool: BlockPool,
    sender: Sender<SequencedBlock>,
    receiver: Receiver<SequencedBlock>,
}

impl BlockQueue {
    /// Wraps `pool`. The FIFO can hold every buffer of the pool at once, so
    /// publishing never waits.
    #[must_use]
    pub fn new(pool: BlockPool) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(pool.capacity());
        Self {
            pool,
            sender,
            receiver,
        }
    }

    /// Returns the underlying pool.
    #[inline]
    #[must_use]
    pub const fn pool(&self) -> &BlockPool {
        &self.pool
    }

    /// Number of published blocks not yet taken.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl WritableBlockQueue for BlockQueue {
    fn try_claim_free_buffer(&self) -> Option<BlockBuffer> {
        self.pool.try_claim_free()
    }

    fn claim_free_buffer(&self, timeout: Duration) -> Option<BlockBuffer> {
        self.pool.claim_free_timeout(timeout)
    }

    fn publish(
        &self,
        index: u64,
        mut buffer: BlockBuffer,
        valid_len: usize,
    ) -> Result<(), PoolError> {
        if let Err(error) = self.pool.mark_ready(&mut buffer, valid_len) {
            // A foreign buffer is rejected again here and simply dropped.
            let _ = self.pool.release(buffer);
            return Err(error);
        }

        // The channel holds every pool buffer and the queue owns a receiver,
        // so this only fails for a buffer the pool never handed out.
        if let Err(unsent) = self.sender.try_send(SequencedBlock { index, buffer }) {
            return self.pool.release(unsent.into_inner().into_buffer());
        }
        Ok(())
    }

    fn discard(&self, buffer: BlockBuffer) -> Result<(), PoolError> {
        self.pool.release(buffer)
    }
}

impl ReadableBlockQueue for BlockQueue {
    fn try_take_next(&self) -> Option<SequencedBlock> {
        self.receiver.try_recv().ok()
    }

    fn take_next(&self, timeout: Duration) -> Option<SequencedBlock> {
        self.receiver.recv_timeout(timeout).ok()
    }

    fn mark_processed(&self, block: SequencedBlock) -> Result<(), PoolError> {
        self.pool.release(block.into_buffer())
    }
}
