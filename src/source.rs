//! Byte sources: where encoded animation data comes from.

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

/// Errors returned while fetching resource bytes.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The resource could not be retrieved.
    #[error("resource unavailable: {0}")]
    Unavailable(String),

    /// An I/O error occurred.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies the bytes of one resource.
pub trait ByteSource {
    /// Fetch the resource, or at most its first `limit` bytes.
    ///
    /// Sources that cannot serve partial reads may return the whole resource.
    fn fetch(&mut self, limit: Option<usize>) -> Result<Vec<u8>, FetchError>;
}

impl ByteSource for &[u8] {
    fn fetch(&mut self, limit: Option<usize>) -> Result<Vec<u8>, FetchError> {
        let end = limit.map_or(self.len(), |l| l.min(self.len()));
        Ok(self[..end].to_vec())
    }
}

impl ByteSource for Vec<u8> {
    fn fetch(&mut self, limit: Option<usize>) -> Result<Vec<u8>, FetchError> {
        self.as_slice().fetch(limit)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn fetch(&mut self, limit: Option<usize>) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(limit)
    }
}

/// Reads a resource from the local filesystem.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct FileSource {
    path: std::path::PathBuf,
}

#[cfg(feature = "std")]
impl FileSource {
    /// Source backed by the file at `path`.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(feature = "std")]
impl ByteSource for FileSource {
    fn fetch(&mut self, limit: Option<usize>) -> Result<Vec<u8>, FetchError> {
        use std::io::Read;

        let file = std::fs::File::open(&self.path)?;
        let mut data = Vec::new();
        match limit {
            Some(limit) => {
                file.take(limit as u64).read_to_end(&mut data)?;
            }
            None => {
                let mut file = file;
                file.read_to_end(&mut data)?;
            }
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn slice_source_honors_limit() {
        let mut src: &[u8] = &[1, 2, 3, 4];
        assert_eq!(src.fetch(Some(2)).unwrap(), vec![1, 2]);
        assert_eq!(src.fetch(Some(10)).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(src.fetch(None).unwrap(), vec![1, 2, 3, 4]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn missing_file_is_io_error() {
        let mut src = FileSource::new("/nonexistent/zengif/test.gif");
        assert!(matches!(src.fetch(None), Err(FetchError::Io(_))));
    }
}
