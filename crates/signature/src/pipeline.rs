//! crates/signature/src/pipeline.rs
//!
//! Orchestration of one signature run.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  claim   ┌───────────┐  take   ┌─────────────────────┐
//! │ blocksig-reader│ ───────▶ │ BlockQueue│ ──────▶ │ blocksig-hash-0..N  │
//! │  (FileReader)  │ ◀─────── │ pool+FIFO │ ◀────── │ (SignatureCalculator│
//! └────────────────┘  publish └───────────┘ release └─────────┬───────────┘
//!                                                            │ set(index)
//!                                                            ▼
//!                                                     ┌────────────┐
//!                                                     │ ResultSink │
//!                                                     └────────────┘
//! ```
//!
//! The calling thread sizes everything, runs the reader and the calculator on
//! scoped named threads, waits for both, and only then drains the sink. If
//! either side cancelled, the recorded cause is returned and nothing is
//! drained.

use std::num::NonZeroUsize;
use std::thread::{self, Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

use fast_io::{BlockPool, DEFAULT_MEMORY_RESERVE_MIB, SysinfoProbe, SystemProbe};
use tracing::{debug, error, info};

use crate::algorithm::{BlockHasher, SignatureAlgorithm};
use crate::calculator::{CalculatorReport, SignatureCalculator};
use crate::cancel::CancellationToken;
use crate::error::{SignatureError, panic_message};
use crate::file::FileSignature;
use crate::layout::{SignatureLayout, calculate_signature_layout};
use crate::queue::BlockQueue;
use crate::reader::FileReader;
use crate::sink::ResultSink;
use crate::source::{ByteSource, FileSource};

const READER_THREAD: &str = "blocksig-reader";
const CALCULATOR_THREAD: &str = "blocksig-calculator";

/// Default wait between cancellation checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Tunables of a signature run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PipelineOptions {
    /// Upper bound on hash workers; `None` uses every logical processor.
    pub worker_limit: Option<NonZeroUsize>,
    /// Longest time a stage waits before re-checking cancellation.
    pub poll_interval: Duration,
    /// Memory left untouched while sizing the block pool, in MiB.
    pub memory_reserve_mib: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            worker_limit: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            memory_reserve_mib: DEFAULT_MEMORY_RESERVE_MIB,
        }
    }
}

impl PipelineOptions {
    /// Caps the number of hash workers.
    #[must_use]
    pub const fn with_worker_limit(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.worker_limit = limit;
        self
    }

    /// Sets the cancellation poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the memory reserve.
    #[must_use]
    pub const fn with_memory_reserve_mib(mut self, reserve: u64) -> Self {
        self.memory_reserve_mib = reserve;
        self
    }
}

/// Sizing and counters of a finished run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PipelineStats {
    /// Buffers actually allocated.
    pub pool_capacity: usize,
    /// Hash worker threads started.
    pub worker_count: usize,
    /// Highest number of buffers claimed at once.
    pub peak_claimed: usize,
    /// Highest number of workers hashing at once.
    pub peak_active_workers: usize,
    /// Bytes read from the input.
    pub bytes_read: u64,
    /// Blocks in the signature.
    pub blocks: u64,
}

/// A signature together with the statistics of the run that produced it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessedFile {
    signature: FileSignature,
    stats: PipelineStats,
}

impl ProcessedFile {
    /// The generated signature.
    #[must_use]
    pub const fn signature(&self) -> &FileSignature {
        &self.signature
    }

    /// Run statistics.
    #[must_use]
    pub const fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Splits into signature and statistics.
    #[must_use]
    pub fn into_parts(self) -> (FileSignature, PipelineStats) {
        (self.signature, self.stats)
    }
}

/// Runs the block pipeline for one input at a time.
#[derive(Debug)]
pub struct FileProcessor<P = SysinfoProbe> {
    probe: P,
    options: PipelineOptions,
}

impl FileProcessor<SysinfoProbe> {
    /// Creates a processor that sizes itself from the live system.
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_probe(SysinfoProbe::new(), options)
    }
}

impl<P: SystemProbe> FileProcessor<P> {
    /// Creates a processor that sizes itself from `probe`.
    pub const fn with_probe(probe: P, options: PipelineOptions) -> Self {
        Self { probe, options }
    }

    /// Returns the configured options.
    #[must_use]
    pub const fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Computes the signature of `source` in blocks of `block_length` bytes.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the run. Configuration failures are
    /// reported before any thread starts; in-flight failures stop both stages
    /// and no signature is produced.
    pub fn process<S, H>(
        &self,
        source: &S,
        block_length: u32,
        hasher: &H,
    ) -> Result<ProcessedFile, SignatureError>
    where
        S: ByteSource + ?Sized,
        H: BlockHasher + ?Sized,
    {
        let started = Instant::now();
        let layout = self.plan(source, block_length).inspect_err(|err| {
            error!(target: "blocksig::pipeline", error = %err, "signature setup failed");
        })?;

        let block_count = layout.block_count();
        let processors = self.probe.logical_processors().max(1);
        let desired_buffers = layout
            .block_count_usize()
            .min(processors.saturating_mul(2));
        let worker_count = self
            .options
            .worker_limit
            .map_or(processors, |limit| limit.get().min(processors));

        let pool = BlockPool::initialize(
            layout.buffer_length(),
            desired_buffers,
            &self.probe,
            self.options.memory_reserve_mib,
        )
        .inspect_err(|err| {
            error!(target: "blocksig::pool", error = %err, "block pool allocation failed");
        })?;

        debug!(
            target: "blocksig::pipeline",
            blocks = block_count,
            block_length = layout.block_length().get(),
            buffers = pool.capacity(),
            desired_buffers,
            workers = worker_count,
            "pipeline sized"
        );

        let queue = BlockQueue::new(pool);
        let sink = ResultSink::new(layout.block_count_usize());
        let cancel = CancellationToken::new();
        let reader = FileReader::new(
            source,
            &queue,
            layout,
            &cancel,
            self.options.poll_interval,
        );
        let calculator = SignatureCalculator::new(worker_count, self.options.poll_interval);

        let (bytes_read, report) = thread::scope(|scope| {
            let reader_thread = spawn_stage(scope, READER_THREAD, &cancel, || reader.run());
            let calculator_thread = spawn_stage(scope, CALCULATOR_THREAD, &cancel, || {
                calculator.run(&queue, hasher, &sink, &cancel, block_count)
            });
            (
                join_stage(reader_thread, READER_THREAD, &cancel),
                join_stage(calculator_thread, CALCULATOR_THREAD, &cancel),
            )
        });

        if cancel.is_cancelled() {
            return Err(cancel.take_cause().unwrap_or(SignatureError::Cancelled));
        }

        let bytes_read = bytes_read.unwrap_or_default();
        let report: CalculatorReport = report.unwrap_or_default();
        let digests = sink.into_digests().inspect_err(|err| {
            error!(target: "blocksig::pipeline", error = %err, "signature incomplete");
        })?;

        let stats = PipelineStats {
            pool_capacity: queue.pool().capacity(),
            worker_count: calculator.worker_count(),
            peak_claimed: queue.pool().peak_claimed(),
            peak_active_workers: report.peak_active_workers,
            bytes_read,
            blocks: block_count,
        };
        log_summary(&source.name(), &stats, started.elapsed());

        Ok(ProcessedFile {
            signature: FileSignature::from_digests(layout, digests),
            stats,
        })
    }

    fn plan<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        block_length: u32,
    ) -> Result<SignatureLayout, SignatureError> {
        let file_length = source.length().map_err(|err| SignatureError::Stat {
            name: source.name(),
            source: err,
        })?;
        let layout = calculate_signature_layout(file_length, block_length)?;
        if layout.block_length() != layout.requested_block_length() {
            debug!(
                target: "blocksig::pipeline",
                requested = block_length,
                effective = layout.block_length().get(),
                file_length,
                "block length shrunk to file length"
            );
        }
        Ok(layout)
    }
}

fn spawn_stage<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: &'static str,
    cancel: &CancellationToken,
    body: F,
) -> Option<ScopedJoinHandle<'scope, T>>
where
    T: Send + 'scope,
    F: FnOnce() -> T + Send + 'scope,
{
    match thread::Builder::new()
        .name(name.to_owned())
        .spawn_scoped(scope, body)
    {
        Ok(handle) => Some(handle),
        Err(source) => {
            let err = SignatureError::ThreadSpawn { name, source };
            error!(target: "blocksig::pipeline", error = %err, "failed to start stage");
            cancel.cancel(err);
            None
        }
    }
}

fn join_stage<T>(
    handle: Option<ScopedJoinHandle<'_, T>>,
    name: &'static str,
    cancel: &CancellationToken,
) -> Option<T> {
    match handle?.join() {
        Ok(value) => Some(value),
        Err(payload) => {
            let err = SignatureError::ThreadPanicked {
                name,
                message: panic_message(payload.as_ref()),
            };
            error!(target: "blocksig::pipeline", error = %err, "stage panicked");
            cancel.cancel(err);
            None
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn log_summary(name: &str, stats: &PipelineStats, elapsed: Duration) {
    let seconds = elapsed.as_secs_f64();
    let mib_per_second = if seconds > 0.0 {
        stats.bytes_read as f64 / (1024.0 * 1024.0) / seconds
    } else {
        0.0
    };
    info!(
        target: "blocksig::pipeline",
        input = name,
        blocks = stats.blocks,
        bytes = stats.bytes_read,
        buffers = stats.pool_capacity,
        workers = stats.worker_count,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        mib_per_second,
        "signature complete"
    );
}

/// Computes the signature of the file at `path` with default options.
///
/// # Errors
///
/// See [`FileProcessor::process`].
pub fn generate_file_signature(
    path: impl Into<std::path::PathBuf>,
    block_length: u32,
    algorithm: SignatureAlgorithm,
) -> Result<FileSignature, SignatureError> {
    FileProcessor::new(PipelineOptions::default())
        .process(&FileSource::new(path), block_length, &algorithm)
        .map(|processed| processed.into_parts().0)
}
