//! crates/signature/src/output.rs
//!
//! Rendering of finished signatures.

use std::io::{self, Write};

/// Receives the digests of a finished signature in ascending index order.
pub trait SignatureWriter {
    /// Writes the digest of block `index`.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying destination.
    fn write_block(&mut self, index: u64, digest: &[u8]) -> io::Result<()>;

    /// Called once after the last block.
    ///
    /// # Errors
    ///
    /// Propagates failures of the underlying destination.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<W: SignatureWriter + ?Sized> SignatureWriter for &mut W {
    fn write_block(&mut self, index: u64, digest: &[u8]) -> io::Result<()> {
        (**self).write_block(index, digest)
    }

    fn finish(&mut self) -> io::Result<()> {
        (**self).finish()
    }
}

/// Writes one `"{index} {HEXDIGEST}"` line per block.
///
/// Hex digits are uppercase with no separators.
///
/// ```
/// use signature::{SignatureWriter, TextSignatureWriter};
///
/// let mut writer = TextSignatureWriter::new(Vec::new());
/// writer.write_block(0, &[0xde, 0xad]).unwrap();
/// writer.finish().unwrap();
/// assert_eq!(writer.into_inner(), b"0 DEAD\n");
/// ```
#[derive(Debug)]
pub struct TextSignatureWriter<W> {
    inner: W,
}

impl<W: Write> TextSignatureWriter<W> {
    /// Wraps `inner`.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns the wrapped destination.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> SignatureWriter for TextSignatureWriter<W> {
    fn write_block(&mut self, index: u64, digest: &[u8]) -> io::Result<()> {
        writeln!(self.inner, "{index} {}", hex::encode_upper(digest))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_are_index_then_hex() {
        let mut writer = TextSignatureWriter::new(Vec::new());
        writer.write_block(0, &[0x00, 0x1f]).unwrap();
        writer.write_block(1, &[0xab]).unwrap();
        writer.write_block(12, &[]).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "0 001F\n1 AB\n12 \n");
    }

    #[test]
    fn write_errors_propagate() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut writer = TextSignatureWriter::new(Broken);
        let error = writer.write_block(0, &[1]).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::BrokenPipe);
    }
}
