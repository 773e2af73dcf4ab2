//! crates/signature/src/source.rs
//!
//! Inputs whose bytes are split into blocks.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// A sized, sequentially readable input.
pub trait ByteSource: Sync {
    /// Reader returned by [`open`](Self::open).
    type Reader: Read + Send;

    /// Name used in logs and error messages.
    fn name(&self) -> String;

    /// Current length of the input in bytes.
    ///
    /// # Errors
    ///
    /// Returns the failure reported while inspecting the input.
    fn length(&self) -> io::Result<u64>;

    /// Opens the input for reading from the start.
    ///
    /// # Errors
    ///
    /// Returns the failure reported while opening the input.
    fn open(&self) -> io::Result<Self::Reader>;
}

impl<S: ByteSource + ?Sized> ByteSource for &S {
    type Reader = S::Reader;

    fn name(&self) -> String {
        (**self).name()
    }

    fn length(&self) -> io::Result<u64> {
        (**self).length()
    }

    fn open(&self) -> io::Result<Self::Reader> {
        (**self).open()
    }
}

/// A regular file on disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source for `path`. Nothing is touched until it is used.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileSource {
    type Reader = File;

    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn length(&self) -> io::Result<u64> {
        let metadata = fs::metadata(&self.path)?;
        if metadata.is_dir() {
            return Err(io::Error::from(io::ErrorKind::IsADirectory));
        }
        Ok(metadata.len())
    }

    fn open(&self) -> io::Result<File> {
        File::open(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_source_reports_length_and_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"0123456789").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.length().unwrap(), 10);

        let mut contents = String::new();
        source.open().unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "0123456789");
        assert_eq!(source.name(), file.path().display().to_string());
    }

    #[test]
    fn missing_file_fails_to_stat() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent"));
        assert_eq!(source.length().unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path());
        assert_eq!(
            source.length().unwrap_err().kind(),
            io::ErrorKind::IsADirectory
        );
    }
}
