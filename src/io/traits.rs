//! Core I/O traits

use std::io::{self, Read, Seek};

use crate::error::{Error, Result};

/// Trait for readers that support both reading and seeking operations
pub trait SeekableReader: Read + Seek {}

impl<T: Read + Seek> SeekableReader for T {}

/// An offset-addressable provider of container bytes
///
/// Implementations exist for in-memory buffers, memory-mapped files and
/// arbitrary seekable readers. All reads are blocking; a block request either
/// returns exactly the requested bytes or fails.
pub trait ByteSource {
    /// Total length of the source in bytes
    fn len(&self) -> Result<u64>;

    /// Whether the source holds no bytes at all
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Fetches `length` bytes starting at `offset`
    fn block(&self, offset: u64, length: usize) -> Result<Vec<u8>>;

    /// Opens a sequential stream positioned at the start of the source
    fn stream(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(SourceStream { source: self, position: 0 }))
    }

    /// Optional file name hint, used in diagnostics
    fn filename(&self) -> Option<&str> {
        None
    }

    /// Fetches the bytes from `offset` to the end of the source
    fn tail(&self, offset: u64) -> Result<Vec<u8>> {
        let len = self.len()?;
        if offset > len {
            return Err(Error::RangeOutOfBounds { offset, length: 0, size: len });
        }
        self.block(offset, (len - offset) as usize)
    }
}

/// Checks that `offset..offset+length` lies inside a source of `size` bytes
pub(crate) fn check_range(offset: u64, length: usize, size: u64) -> Result<()> {
    let end = offset.checked_add(length as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::RangeOutOfBounds {
            offset,
            length: length as u64,
            size,
        }),
    }
}

/// Sequential reader over any [`ByteSource`], fetching small blocks on demand
struct SourceStream<'a, S: ByteSource + ?Sized> {
    source: &'a S,
    position: u64,
}

impl<S: ByteSource + ?Sized> Read for SourceStream<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self
            .source
            .len()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        if self.position >= len || buf.is_empty() {
            return Ok(0);
        }
        let n = buf.len().min((len - self.position) as usize);
        let bytes = self
            .source
            .block(self.position, n)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        buf[..n].copy_from_slice(&bytes);
        self.position += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ByteSourceArray;

    #[test]
    fn test_check_range() {
        assert!(check_range(0, 4, 4).is_ok());
        assert!(check_range(2, 2, 4).is_ok());
        assert!(check_range(3, 2, 4).is_err());
        assert!(check_range(u64::MAX, 2, 4).is_err());
    }

    #[test]
    fn test_default_stream_reads_sequentially() {
        struct Plain(Vec<u8>);
        impl ByteSource for Plain {
            fn len(&self) -> Result<u64> {
                Ok(self.0.len() as u64)
            }
            fn block(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
                check_range(offset, length, self.0.len() as u64)?;
                Ok(self.0[offset as usize..offset as usize + length].to_vec())
            }
        }

        let source = Plain(vec![1, 2, 3, 4, 5]);
        let mut stream = source.stream().unwrap();
        let mut buf = [0u8; 3];
        stream.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![4, 5]);
    }

    #[test]
    fn test_tail() {
        let source = ByteSourceArray::new(vec![9, 8, 7, 6]);
        assert_eq!(source.tail(2).unwrap(), vec![7, 6]);
        assert!(source.tail(4).unwrap().is_empty());
        assert!(source.tail(5).is_err());
    }
}
