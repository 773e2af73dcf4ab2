//! crates/fast_io/src/buffer_pool.rs
//!
//! Thread-safe pool of block buffers with explicit Free/Claimed slot states.
//!
//! Buffers are handed out by value. While a slot is [`SlotState::Claimed`] the
//! pool holds nothing for it and exactly one holder owns the
//! [`BlockBuffer`]; [`BlockPool::release`] takes the buffer back and flips the
//! slot to [`SlotState::Free`]. A second release of the same slot is therefore
//! impossible without the buffer, and a stale or foreign buffer is rejected.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::trace;

use crate::block_store::{BlockBuffer, BlockStore};
use crate::error::PoolError;
use crate::system::SystemProbe;

/// Observable state of one pool slot.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SlotState {
    /// The buffer is parked in the pool and may be claimed.
    Free,
    /// The buffer is owned by the reader, the queue, or a worker.
    Claimed,
}

#[derive(Debug)]
struct PoolState {
    parked: Vec<Option<BlockBuffer>>,
    claimed: usize,
    peak_claimed: usize,
}

impl PoolState {
    fn claim_first_free(&mut self) -> Option<BlockBuffer> {
        let buffer = self.parked.iter_mut().find_map(Option::take)?;
        self.claimed += 1;
        self.peak_claimed = self.peak_claimed.max(self.claimed);
        Some(buffer)
    }

    fn is_exhausted(&self) -> bool {
        self.claimed == self.parked.len()
    }
}

/// A fixed set of block buffers shared between the reader and hash workers.
///
/// # Example
///
/// ```
/// use fast_io::{BlockPool, SlotState, StaticProbe};
///
/// let pool = BlockPool::initialize(1024, 2, &StaticProbe::unlimited(2), 0).unwrap();
/// let mut buffer = pool.try_claim_free().unwrap();
/// buffer.writable(3).unwrap().copy_from_slice(b"abc");
/// pool.mark_ready(&mut buffer, 3).unwrap();
/// assert_eq!(buffer.valid(), b"abc");
/// assert_eq!(pool.slot_state(buffer.slot()), Some(SlotState::Claimed));
/// pool.release(buffer).unwrap();
/// assert_eq!(pool.claimed(), 0);
/// ```
#[derive(Debug)]
pub struct BlockPool {
    state: Mutex<PoolState>,
    freed: Condvar,
    store_id: u64,
    block_length: usize,
    capacity: usize,
}

impl BlockPool {
    /// Allocates a [`BlockStore`] and wraps it in a pool.
    ///
    /// See [`BlockStore::allocate`] for the capping rules.
    ///
    /// # Errors
    ///
    /// Propagates the [`PoolError`] from [`BlockStore::allocate`].
    pub fn initialize<P: SystemProbe + ?Sized>(
        block_length: usize,
        desired: usize,
        probe: &P,
        reserve_mib: u64,
    ) -> Result<Self, PoolError> {
        BlockStore::allocate(block_length, desired, probe, reserve_mib).map(Self::from_store)
    }

    /// Wraps an already allocated store; every slot starts Free.
    #[must_use]
    pub fn from_store(store: BlockStore) -> Self {
        let store_id = store.id();
        let block_length = store.block_length();
        let parked: Vec<_> = store.into_buffers().into_iter().map(Some).collect();
        let capacity = parked.len();

        Self {
            state: Mutex::new(PoolState {
                parked,
                claimed: 0,
                peak_claimed: 0,
            }),
            freed: Condvar::new(),
            store_id,
            block_length,
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the lowest-numbered Free slot without waiting.
    #[must_use]
    pub fn try_claim_free(&self) -> Option<BlockBuffer> {
        let buffer = self.lock().claim_first_free();
        if let Some(buffer) = &buffer {
            trace!(target: "blocksig::pool", slot = buffer.slot(), "slot claimed");
        }
        buffer
    }

    /// Claims a Free slot, waiting up to `timeout` for one to be released.
    #[must_use]
    pub fn claim_free_timeout(&self, timeout: Duration) -> Option<BlockBuffer> {
        let guard = self.lock();
        let (mut state, _) = self
            .freed
            .wait_timeout_while(guard, timeout, |state| state.is_exhausted())
            .unwrap_or_else(PoisonError::into_inner);
        let buffer = state.claim_first_free();
        drop(state);

        if let Some(buffer) = &buffer {
            trace!(target: "blocksig::pool", slot = buffer.slot(), "slot claimed");
        }
        buffer
    }

    /// Records that the first `valid_len` bytes of a claimed buffer hold block
    /// data.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ForeignBuffer`] when the buffer came from another pool.
    /// - [`PoolError::SlotNotClaimed`] when the slot is currently Free.
    /// - [`PoolError::LengthExceedsCapacity`] when `valid_len` is too large.
    pub fn mark_ready(&self, buffer: &mut BlockBuffer, valid_len: usize) -> Result<(), PoolError> {
        self.check_claimed(buffer)?;
        if valid_len > buffer.capacity() {
            return Err(PoolError::LengthExceedsCapacity {
                length: valid_len,
                capacity: buffer.capacity(),
            });
        }
        buffer.set_valid_len(valid_len);
        Ok(())
    }

    /// Returns a claimed buffer to the pool, making its slot Free and waking
    /// one waiter.
    ///
    /// # Errors
    ///
    /// - [`PoolError::ForeignBuffer`] when the buffer came from another pool.
    /// - [`PoolError::SlotNotClaimed`] when the slot is already Free.
    pub fn release(&self, mut buffer: BlockBuffer) -> Result<(), PoolError> {
        let slot = buffer.slot();
        {
            let mut state = self.lock();
            self.check_slot(&state, &buffer)?;
            buffer.set_valid_len(0);
            state.parked[slot] = Some(buffer);
            state.claimed -= 1;
        }
        self.freed.notify_one();
        trace!(target: "blocksig::pool", slot, "slot released");
        Ok(())
    }

    fn check_claimed(&self, buffer: &BlockBuffer) -> Result<(), PoolError> {
        let state = self.lock();
        self.check_slot(&state, buffer)
    }

    fn check_slot(&self, state: &PoolState, buffer: &BlockBuffer) -> Result<(), PoolError> {
        let slot = buffer.slot();
        if buffer.store_id() != self.store_id || slot >= state.parked.len() {
            return Err(PoolError::ForeignBuffer { slot });
        }
        if state.parked[slot].is_some() {
            return Err(PoolError::SlotNotClaimed { slot });
        }
        Ok(())
    }

    /// State of `slot`, or `None` when the index is out of range.
    #[must_use]
    pub fn slot_state(&self, slot: usize) -> Option<SlotState> {
        self.lock().parked.get(slot).map(|parked| {
            if parked.is_some() {
                SlotState::Free
            } else {
                SlotState::Claimed
            }
        })
    }

    /// Number of slots in the pool.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Capacity of every buffer in bytes.
    #[inline]
    #[must_use]
    pub const fn block_length(&self) -> usize {
        self.block_length
    }

    /// Number of slots currently Claimed.
    #[must_use]
    pub fn claimed(&self) -> usize {
        self.lock().claimed
    }

    /// Number of slots currently Free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.capacity - self.claimed()
    }

    /// Highest number of simultaneously Claimed slots observed.
    #[must_use]
    pub fn peak_claimed(&self) -> usize {
        self.lock().peak_claimed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::StaticProbe;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn pool(capacity: usize) -> BlockPool {
        BlockPool::initialize(1024, capacity, &StaticProbe::unlimited(4), 0).unwrap()
    }

    #[test]
    fn new_pool_has_every_slot_free() {
        let pool = pool(3);
        assert_eq!(pool.capacity(), 3);
        assert_eq!(pool.available(), 3);
        assert!((0..3).all(|slot| pool.slot_state(slot) == Some(SlotState::Free)));
        assert_eq!(pool.slot_state(3), None);
    }

    #[test]
    fn claims_lowest_free_slot_first() {
        let pool = pool(3);
        let a = pool.try_claim_free().unwrap();
        let b = pool.try_claim_free().unwrap();
        assert_eq!((a.slot(), b.slot()), (0, 1));

        pool.release(a).unwrap();
        let c = pool.try_claim_free().unwrap();
        assert_eq!(c.slot(), 0);
    }

    #[test]
    fn exhausted_pool_returns_none() {
        let pool = pool(1);
        let held = pool.try_claim_free().unwrap();
        assert!(pool.try_claim_free().is_none());
        assert_eq!(pool.claimed(), 1);
        pool.release(held).unwrap();
        assert!(pool.try_claim_free().is_some());
    }

    #[test]
    fn claim_timeout_expires_when_exhausted() {
        let pool = pool(1);
        let _held = pool.try_claim_free().unwrap();
        let start = Instant::now();
        assert!(pool.claim_free_timeout(Duration::from_millis(20)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn claim_timeout_wakes_on_release() {
        let pool = Arc::new(pool(1));
        let held = pool.try_claim_free().unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.claim_free_timeout(Duration::from_secs(10)))
        };
        thread::sleep(Duration::from_millis(20));
        pool.release(held).unwrap();

        let claimed = waiter.join().unwrap();
        assert_eq!(claimed.map(|b| b.slot()), Some(0));
    }

    #[test]
    fn mark_ready_sets_valid_prefix() {
        let pool = pool(1);
        let mut buffer = pool.try_claim_free().unwrap();
        buffer.writable(4).unwrap().copy_from_slice(b"data");
        pool.mark_ready(&mut buffer, 4).unwrap();
        assert_eq!(buffer.valid(), b"data");
        assert_eq!(
            pool.mark_ready(&mut buffer, 2048),
            Err(PoolError::LengthExceedsCapacity {
                length: 2048,
                capacity: 1024
            })
        );
    }

    #[test]
    fn release_clears_valid_length() {
        let pool = pool(1);
        let mut buffer = pool.try_claim_free().unwrap();
        pool.mark_ready(&mut buffer, 10).unwrap();
        pool.release(buffer).unwrap();
        assert_eq!(pool.try_claim_free().unwrap().valid_len(), 0);
    }

    #[test]
    fn foreign_buffer_is_rejected() {
        let ours = pool(2);
        let theirs = pool(2);
        let _mine = ours.try_claim_free().unwrap();
        let stranger = theirs.try_claim_free().unwrap();

        assert_eq!(ours.release(stranger), Err(PoolError::ForeignBuffer { slot: 0 }));
        assert_eq!(ours.claimed(), 1);
    }

    #[test]
    fn peak_claimed_tracks_high_water_mark() {
        let pool = pool(4);
        let held: Vec<_> = (0..3).map(|_| pool.try_claim_free().unwrap()).collect();
        for buffer in held {
            pool.release(buffer).unwrap();
        }
        let _one = pool.try_claim_free().unwrap();
        assert_eq!(pool.peak_claimed(), 3);
        assert_eq!(pool.claimed(), 1);
    }

    #[test]
    fn concurrent_claims_never_exceed_capacity() {
        let pool = Arc::new(pool(3));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..200 {
                        if let Some(buffer) = pool.claim_free_timeout(Duration::from_millis(5)) {
                            assert!(pool.claimed() <= pool.capacity());
                            pool.release(buffer).unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(pool.claimed(), 0);
        assert!(pool.peak_claimed() <= 3);
    }
}
