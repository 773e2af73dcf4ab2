//! crates/signature/src/calculator.rs
//!
//! Fixed pool of hash workers draining the block queue.
//!
//! The calculator builds a rayon thread pool with one thread per permitted
//! worker and runs one long-lived loop on each. A worker repeatedly takes the
//! next published block, hashes it, stores the digest at the block's index and
//! returns the buffer to the pool. Workers stop once every block has been
//! taken or the [`CancellationToken`] fires; a block already in hand is always
//! finished and released first.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{debug, error, trace};

use crate::algorithm::BlockHasher;
use crate::cancel::CancellationToken;
use crate::error::{SignatureError, panic_message};
use crate::queue::{ReadableBlockQueue, SequencedBlock};
use crate::sink::ResultSink;

/// Counters gathered while hashing.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CalculatorReport {
    /// Blocks whose digest was stored.
    pub blocks_hashed: u64,
    /// Highest number of workers hashing at the same instant.
    pub peak_active_workers: usize,
}

/// Coordinator of the hash workers.
#[derive(Clone, Copy, Debug)]
pub struct SignatureCalculator {
    worker_count: usize,
    poll_interval: Duration,
}

struct WorkerShared<'a, Q: ?Sized, H: ?Sized> {
    queue: &'a Q,
    hasher: &'a H,
    sink: &'a ResultSink,
    cancel: &'a CancellationToken,
    block_count: u64,
    poll_interval: Duration,
    taken: AtomicU64,
    hashed: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl SignatureCalculator {
    /// Creates a calculator running `worker_count` workers (at least one).
    #[must_use]
    pub const fn new(worker_count: usize, poll_interval: Duration) -> Self {
        Self {
            worker_count: if worker_count == 0 { 1 } else { worker_count },
            poll_interval,
        }
    }

    /// Number of worker threads.
    #[inline]
    #[must_use]
    pub const fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Hashes `block_count` blocks from `queue` into `sink`.
    ///
    /// Returns after every worker has stopped. Failures are logged and
    /// recorded on `cancel` rather than returned.
    pub fn run<Q, H>(
        &self,
        queue: &Q,
        hasher: &H,
        sink: &ResultSink,
        cancel: &CancellationToken,
        block_count: u64,
    ) -> CalculatorReport
    where
        Q: ReadableBlockQueue + ?Sized,
        H: BlockHasher + ?Sized,
    {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|index| format!("blocksig-hash-{index}"))
            .build()
        {
            Ok(pool) => pool,
            Err(err) => {
                let err = SignatureError::WorkerPool(err);
                error!(target: "blocksig::calculator", error = %err, "worker pool failed to start");
                cancel.cancel(err);
                return CalculatorReport::default();
            }
        };

        let shared = WorkerShared {
            queue,
            hasher,
            sink,
            cancel,
            block_count,
            poll_interval: self.poll_interval,
            taken: AtomicU64::new(0),
            hashed: AtomicU64::new(0),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        };

        debug!(
            target: "blocksig::calculator",
            workers = self.worker_count,
            blocks = block_count,
            "hash workers starting"
        );

        pool.scope(|scope| {
            for worker in 0..self.worker_count {
                let shared = &shared;
                scope.spawn(move |_| shared.work(worker));
            }
        });

        CalculatorReport {
            blocks_hashed: shared.hashed.load(Ordering::Acquire),
            peak_active_workers: shared.peak_active.load(Ordering::Acquire),
        }
    }
}

impl<Q, H> WorkerShared<'_, Q, H>
where
    Q: ReadableBlockQueue + ?Sized,
    H: BlockHasher + ?Sized,
{
    fn work(&self, worker: usize) {
        loop {
            if self.cancel.is_cancelled() {
                trace!(target: "blocksig::calculator", worker, "worker observed cancellation");
                return;
            }
            if self.taken.load(Ordering::Acquire) >= self.block_count {
                return;
            }
            let Some(block) = self.queue.take_next(self.poll_interval) else {
                continue;
            };
            self.taken.fetch_add(1, Ordering::AcqRel);
            self.process(worker, block);
        }
    }

    fn process(&self, worker: usize, block: SequencedBlock) {
        let index = block.index();
        let active = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_active.fetch_max(active, Ordering::AcqRel);

        let outcome = self.hash_block(&block);

        self.active.fetch_sub(1, Ordering::AcqRel);
        let released = self.queue.mark_processed(block);

        match outcome.and(released.map_err(SignatureError::from)) {
            Ok(()) => {
                self.hashed.fetch_add(1, Ordering::AcqRel);
                trace!(target: "blocksig::calculator", worker, index, "block hashed");
            }
            Err(err) => {
                error!(target: "blocksig::calculator", worker, index, error = %err, "hash worker failed");
                self.cancel.cancel(err);
            }
        }
    }

    fn hash_block(&self, block: &SequencedBlock) -> Result<(), SignatureError> {
        let index = block.index();
        let digest = panic::catch_unwind(AssertUnwindSafe(|| self.hasher.hash(block.data())))
            .map_err(|payload| SignatureError::WorkerPanicked {
                index,
                message: panic_message(payload.as_ref()),
            })?
            .map_err(|source| SignatureError::Hash { index, source })?;
        self.sink.set(index, digest)?;
        Ok(())
    }
}
