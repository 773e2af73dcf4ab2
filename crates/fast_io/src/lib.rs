//! Memory-bounded block buffers for the signature pipeline.
//!
//! This crate owns the fixed-capacity byte buffers that carry file blocks from
//! the reader to the hash workers.
//!
//! # Components
//!
//! - [`BlockStore`] allocates the buffers once, stopping early when the
//!   [`SystemProbe`] reports that available memory would drop below a safety
//!   reserve.
//! - [`BlockPool`] tracks each slot as [`SlotState::Free`] or
//!   [`SlotState::Claimed`] under a single mutex and hands buffers out by
//!   value, so a buffer has exactly one owner at any instant.
//! - [`SysinfoProbe`] and [`StaticProbe`] answer the "how much memory and how
//!   many cores" questions used to size the pipeline.
//!
//! # Design Principles
//!
//! 1. **Allocate once** - buffers are created at initialization and reused for
//!    every block; contents are overwritten, never resized.
//! 2. **Degrade, don't fail** - memory pressure caps the pool instead of
//!    aborting the run.
//! 3. **Ownership is the lock** - a claimed buffer lives outside the pool, so
//!    concurrent access to one buffer cannot be expressed.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod block_store;
pub mod buffer_pool;
mod error;
pub mod system;

pub use block_store::{
    BlockBuffer, BlockStore, DEFAULT_MEMORY_RESERVE_MIB, MIN_BLOCK_LENGTH,
};
pub use buffer_pool::{BlockPool, SlotState};
pub use error::PoolError;
pub use system::{StaticProbe, SysinfoProbe, SystemProbe};
