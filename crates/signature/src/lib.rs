#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Bounded-memory block signature generation.
//!
//! A file is split into fixed-size sequential blocks ([`SignatureLayout`]).
//! One reader thread fills a small pool of reusable buffers in file order
//! while a fixed pool of hash workers digests them concurrently. Digests are
//! collected by index, so the finished [`FileSignature`] is in file order no
//! matter which worker finished first.
//!
//! Memory stays bounded: at most `min(blocks, 2 × cores)` buffers exist,
//! fewer when available RAM minus a reserve cannot hold more.
//!
//! # Example
//!
//! ```no_run
//! use signature::{FileProcessor, FileSource, PipelineOptions, SignatureAlgorithm};
//!
//! let processor = FileProcessor::new(PipelineOptions::default());
//! let processed = processor
//!     .process(&FileSource::new("disk.img"), 1 << 20, &SignatureAlgorithm::SHA256)
//!     .expect("signature");
//! for block in processed.signature() {
//!     println!("{} {}", block.index(), block.digest_hex());
//! }
//! ```

mod algorithm;
mod block;
mod calculator;
mod cancel;
mod error;
mod file;
mod layout;
mod output;
mod pipeline;
mod queue;
mod reader;
mod sink;
mod source;

pub use crate::algorithm::{BlockHasher, HashError, SignatureAlgorithm};
pub use crate::block::SignatureBlock;
pub use crate::calculator::{CalculatorReport, SignatureCalculator};
pub use crate::cancel::CancellationToken;
pub use crate::error::{
    EXIT_ALLOCATION, EXIT_FILE_IO, EXIT_FILE_SELECT, EXIT_OUTPUT, EXIT_SYNTAX, EXIT_WORKER,
    SignatureError,
};
pub use crate::file::FileSignature;
pub use crate::layout::{
    MAX_BLOCK_COUNT, SignatureLayout, SignatureLayoutError, calculate_signature_layout,
};
pub use crate::output::{SignatureWriter, TextSignatureWriter};
pub use crate::pipeline::{
    DEFAULT_POLL_INTERVAL, FileProcessor, PipelineOptions, PipelineStats, ProcessedFile,
    generate_file_signature,
};
pub use crate::queue::{BlockQueue, ReadableBlockQueue, SequencedBlock, WritableBlockQueue};
pub use crate::reader::FileReader;
pub use crate::sink::{ResultSink, SinkError};
pub use crate::source::{ByteSource, FileSource};

pub use checksums::ChecksumAlgorithm;
pub use fast_io::{BlockBuffer, BlockPool, StaticProbe, SysinfoProbe, SystemProbe};
