//! crates/fast_io/src/system.rs
//!
//! Host resource probes used to size the block pool and the worker pool.

use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::thread;

use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tracing::debug;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Answers the resource questions asked while sizing the pipeline.
///
/// Implementations must be cheap to call repeatedly: the block store queries
/// available memory once per buffer it allocates.
pub trait SystemProbe: Send + Sync {
    /// Currently available physical memory in MiB.
    fn available_memory_mib(&self) -> u64;

    /// Number of logical processors usable by this process.
    fn logical_processors(&self) -> usize;
}

/// Live probe backed by `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
    processors: usize,
}

impl std::fmt::Debug for SysinfoProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProbe")
            .field("processors", &self.processors)
            .finish_non_exhaustive()
    }
}

impl SysinfoProbe {
    /// Creates a probe that refreshes only RAM statistics.
    #[must_use]
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::new().with_ram()),
        );
        let processors = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);

        Self {
            system: Mutex::new(system),
            processors,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn available_memory_mib(&self) -> u64 {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory_specifics(MemoryRefreshKind::new().with_ram());

        // Platforms without memory accounting report zero total memory.
        if system.total_memory() == 0 {
            debug!(target: "blocksig::pool", "memory statistics unavailable; not capping pool");
            return u64::MAX;
        }

        system.available_memory() / BYTES_PER_MIB
    }

    fn logical_processors(&self) -> usize {
        self.processors
    }
}

/// Probe returning fixed values, for deterministic runs and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StaticProbe {
    available_mib: u64,
    processors: usize,
}

impl StaticProbe {
    /// Creates a probe reporting `available_mib` of free memory and
    /// `processors` logical cores (at least one).
    #[must_use]
    pub const fn new(available_mib: u64, processors: usize) -> Self {
        Self {
            available_mib,
            processors: if processors == 0 { 1 } else { processors },
        }
    }

    /// Probe with effectively unlimited memory.
    #[must_use]
    pub const fn unlimited(processors: usize) -> Self {
        Self::new(u64::MAX, processors)
    }
}

impl SystemProbe for StaticProbe {
    fn available_memory_mib(&self) -> u64 {
        self.available_mib
    }

    fn logical_processors(&self) -> usize {
        self.processors
    }
}

impl<P: SystemProbe + ?Sized> SystemProbe for &P {
    fn available_memory_mib(&self) -> u64 {
        (**self).available_memory_mib()
    }

    fn logical_processors(&self) -> usize {
        (**self).logical_processors()
    }
}
