//! crates/signature/src/reader.rs
//!
//! Single producer that fills pool buffers from the input in file order.

use std::io::{self, Read};
use std::time::Duration;

use fast_io::BlockBuffer;
use tracing::{debug, error, trace};

use crate::cancel::CancellationToken;
use crate::error::SignatureError;
use crate::layout::SignatureLayout;
use crate::queue::WritableBlockQueue;
use crate::source::ByteSource;

/// Reads every block of a layout into the queue.
///
/// Failures are never returned: they are logged, recorded on the
/// [`CancellationToken`], and the reader stops. A cancellation raised
/// elsewhere is observed while waiting for a free buffer.
#[derive(Debug)]
pub struct FileReader<'a, S: ?Sized, Q: ?Sized> {
    source: &'a S,
    queue: &'a Q,
    layout: SignatureLayout,
    cancel: &'a CancellationToken,
    poll_interval: Duration,
}

impl<'a, S, Q> FileReader<'a, S, Q>
where
    S: ByteSource + ?Sized,
    Q: WritableBlockQueue + ?Sized,
{
    /// Creates a reader for `layout` over `source`.
    pub const fn new(
        source: &'a S,
        queue: &'a Q,
        layout: SignatureLayout,
        cancel: &'a CancellationToken,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            queue,
            layout,
            cancel,
            poll_interval,
        }
    }

    /// Reads and publishes every block, returning the number of bytes read.
    pub fn run(&self) -> u64 {
        let mut bytes_read = 0;
        match self.read_blocks(&mut bytes_read) {
            Ok(true) => debug!(
                target: "blocksig::reader",
                blocks = self.layout.block_count(),
                bytes = bytes_read,
                "reader finished"
            ),
            Ok(false) => debug!(
                target: "blocksig::reader",
                bytes = bytes_read,
                "reader stopped by cancellation"
            ),
            Err(err) => {
                error!(target: "blocksig::reader", error = %err, "reader failed");
                self.cancel.cancel(err);
            }
        }
        bytes_read
    }

    /// Returns `Ok(false)` when stopped by cancellation.
    fn read_blocks(&self, bytes_read: &mut u64) -> Result<bool, SignatureError> {
        let mut reader = self.source.open().map_err(|source| SignatureError::Open {
            name: self.source.name(),
            source,
        })?;

        for (index, expected) in (0u64..).zip(self.layout.block_lengths()) {
            let Some(mut buffer) = self.claim() else {
                return Ok(false);
            };

            if let Err(err) = fill_block(&mut reader, &mut buffer, index, expected) {
                if let Err(discard) = self.queue.discard(buffer) {
                    debug!(target: "blocksig::reader", error = %discard, "discard failed");
                }
                return Err(err);
            }

            self.queue.publish(index, buffer, expected)?;
            *bytes_read += expected as u64;
            trace!(target: "blocksig::reader", index, len = expected, "block published");
        }

        check_end_of_input(&mut reader, self.layout)?;
        Ok(true)
    }

    fn claim(&self) -> Option<BlockBuffer> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            if let Some(buffer) = self.queue.claim_free_buffer(self.poll_interval) {
                return Some(buffer);
            }
        }
    }
}

/// Reads exactly `expected` bytes into `buffer`.
///
/// Partial reads are continued until the block is full; end of input first
/// is a [`SignatureError::ShortRead`].
fn fill_block<R: Read + ?Sized>(
    reader: &mut R,
    buffer: &mut BlockBuffer,
    index: u64,
    expected: usize,
) -> Result<(), SignatureError> {
    let target = buffer.writable(expected)?;
    let mut filled = 0;
    while filled < expected {
        match reader.read(&mut target[filled..]) {
            Ok(0) => {
                return Err(SignatureError::ShortRead {
                    index,
                    expected,
                    actual: filled,
                });
            }
            Ok(read) => filled += read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(source) => return Err(SignatureError::Read { index, source }),
        }
    }
    Ok(())
}

fn check_end_of_input<R: Read + ?Sized>(
    reader: &mut R,
    layout: SignatureLayout,
) -> Result<(), SignatureError> {
    let mut probe = [0u8; 1];
    loop {
        return match reader.read(&mut probe) {
            Ok(0) => Ok(()),
            Ok(_) => Err(SignatureError::TrailingData {
                expected: layout.file_size(),
            }),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => Err(SignatureError::Read {
                index: layout.block_count(),
                source,
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::calculate_signature_layout;
    use crate::queue::{BlockQueue, ReadableBlockQueue};
    use fast_io::{BlockPool, StaticProbe};
    use std::io::Cursor;

    /// Serves bytes from memory, at most `chunk` bytes per read.
    struct Trickle {
        data: Vec<u8>,
        chunk: usize,
    }

    impl ByteSource for Trickle {
        type Reader = TrickleReader;

        fn name(&self) -> String {
            "trickle".to_owned()
        }

        fn length(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn open(&self) -> io::Result<TrickleReader> {
            Ok(TrickleReader {
                inner: Cursor::new(self.data.clone()),
                chunk: self.chunk,
                interrupt_next: true,
            })
        }
    }

    struct TrickleReader {
        inner: Cursor<Vec<u8>>,
        chunk: usize,
        interrupt_next: bool,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if std::mem::take(&mut self.interrupt_next) {
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            self.interrupt_next = true;
            let len = buf.len().min(self.chunk);
            self.inner.read(&mut buf[..len])
        }
    }

    fn queue(capacity: usize) -> BlockQueue {
        BlockQueue::new(BlockPool::initialize(1024, capacity, &StaticProbe::unlimited(1), 0).unwrap())
    }

    fn drain(queue: &BlockQueue) -> Vec<(u64, Vec<u8>)> {
        let mut blocks = Vec::new();
        while let Some(block) = queue.try_take_next() {
            blocks.push((block.index(), block.data().to_vec()));
            queue.mark_processed(block).unwrap();
        }
        blocks
    }

    #[test]
    fn partial_and_interrupted_reads_fill_whole_blocks() {
        let data: Vec<u8> = (0..2500u32).map(|i| (i % 251) as u8).collect();
        let source = Trickle {
            data: data.clone(),
            chunk: 300,
        };
        let layout = calculate_signature_layout(2500, 1024).unwrap();
        let queue = queue(3);
        let cancel = CancellationToken::new();

        let reader = FileReader::new(&source, &queue, layout, &cancel, Duration::from_millis(10));
        assert_eq!(reader.run(), 2500);
        assert!(!cancel.is_cancelled());

        let blocks = drain(&queue);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0], (0, data[..1024].to_vec()));
        assert_eq!(blocks[1], (1, data[1024..2048].to_vec()));
        assert_eq!(blocks[2], (2, data[2048..].to_vec()));
    }

    #[test]
    fn empty_input_publishes_one_empty_block() {
        let source = Trickle {
            data: Vec::new(),
            chunk: 1,
        };
        let layout = calculate_signature_layout(0, 1024).unwrap();
        let queue = queue(1);
        let cancel = CancellationToken::new();

        FileReader::new(&source, &queue, layout, &cancel, Duration::from_millis(10)).run();
        assert_eq!(drain(&queue), vec![(0, Vec::new())]);
    }

    #[test]
    fn short_input_cancels_with_short_read() {
        let source = Trickle {
            data: vec![7; 1500],
            chunk: 4096,
        };
        // Layout claims 2048 bytes but only 1500 exist.
        let layout = calculate_signature_layout(2048, 1024).unwrap();
        let queue = queue(2);
        let cancel = CancellationToken::new();

        FileReader::new(&source, &queue, layout, &cancel, Duration::from_millis(10)).run();
        assert!(matches!(
            cancel.take_cause(),
            Some(SignatureError::ShortRead {
                index: 1,
                expected: 1024,
                actual: 476
            })
        ));
        // Block 0 was published; block 1's buffer went back to the pool.
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.pool().claimed(), 1);
    }

    #[test]
    fn grown_input_cancels_with_trailing_data() {
        let source = Trickle {
            data: vec![1; 1100],
            chunk: 4096,
        };
        let layout = calculate_signature_layout(1024, 1024).unwrap();
        let queue = queue(1);
        let cancel = CancellationToken::new();

        FileReader::new(&source, &queue, layout, &cancel, Duration::from_millis(10)).run();
        assert!(matches!(
            cancel.take_cause(),
            Some(SignatureError::TrailingData { expected: 1024 })
        ));
    }

    #[test]
    fn cancellation_stops_waiting_for_buffers() {
        let source = Trickle {
            data: vec![0; 4096],
            chunk: 4096,
        };
        let layout = calculate_signature_layout(4096, 1024).unwrap();
        // One buffer and nobody consuming: the reader blocks after block 0.
        let queue = queue(1);
        let cancel = CancellationToken::new();

        std::thread::scope(|scope| {
            let handle = scope.spawn(|| {
                FileReader::new(&source, &queue, layout, &cancel, Duration::from_millis(5)).run()
            });
            std::thread::sleep(Duration::from_millis(30));
            cancel.cancel(SignatureError::Cancelled);
            assert_eq!(handle.join().unwrap(), 1024);
        });
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn open_failure_is_recorded() {
        struct Unopenable;

        impl ByteSource for Unopenable {
            type Reader = Cursor<Vec<u8>>;

            fn name(&self) -> String {
                "unopenable".to_owned()
            }

            fn length(&self) -> io::Result<u64> {
                Ok(0)
            }

            fn open(&self) -> io::Result<Cursor<Vec<u8>>> {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            }
        }

        let layout = calculate_signature_layout(0, 1024).unwrap();
        let queue = queue(1);
        let cancel = CancellationToken::new();
        FileReader::new(&Unopenable, &queue, layout, &cancel, Duration::from_millis(5)).run();
        assert!(matches!(
            cancel.take_cause(),
            Some(SignatureError::Open { .. })
        ));
        assert_eq!(queue.pool().claimed(), 0);
    }
}
