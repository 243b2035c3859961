//! Buffered reading utilities
//!
//! Directory walks issue many small reads at scattered offsets (entry
//! counts, 12-byte entries, oversized values). The buffered reader keeps one
//! window of the underlying reader in memory and serves positioned reads from
//! it whenever they fall inside the window.

use std::io::{self, Read, Seek, SeekFrom};

use crate::io::SeekableReader;

const DEFAULT_CAPACITY: usize = 8192;

/// A positioned, windowed reader over any [`SeekableReader`]
pub struct BufferedReader<R: SeekableReader> {
    inner: R,
    buffer: Vec<u8>,
    /// Absolute offset of `buffer[0]`
    window_start: u64,
    /// Number of valid bytes in `buffer`
    window_len: usize,
    /// Absolute read position for the `Read` impl
    position: u64,
}

impl<R: SeekableReader> BufferedReader<R> {
    /// Creates a new buffered reader with default window size (8KB)
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner)
    }

    /// Creates a new buffered reader with the given window size
    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            inner,
            buffer: vec![0; capacity.max(1)],
            window_start: 0,
            window_len: 0,
            position: 0,
        }
    }

    /// Returns a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Consumes the buffered reader and returns the underlying reader
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Total length of the underlying reader
    pub fn stream_len(&mut self) -> io::Result<u64> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        // The window stays valid; only the inner cursor moved.
        Ok(len)
    }

    fn in_window(&self, offset: u64, length: usize) -> bool {
        offset >= self.window_start
            && offset.saturating_add(length as u64) <= self.window_start + self.window_len as u64
    }

    fn fill_window(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < self.buffer.len() {
            let n = self.inner.read(&mut self.buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        self.window_start = offset;
        self.window_len = filled;
        Ok(())
    }

    /// Reads exactly `buf.len()` bytes at an absolute offset
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if buf.len() > self.buffer.len() {
            self.inner.seek(SeekFrom::Start(offset))?;
            return self.inner.read_exact(buf);
        }
        if !self.in_window(offset, buf.len()) {
            self.fill_window(offset)?;
            if !self.in_window(offset, buf.len()) {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("{} bytes at offset {} exceed the stream", buf.len(), offset),
                ));
            }
        }
        let start = (offset - self.window_start) as usize;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    /// Reads a chunk of `size` bytes at an absolute offset
    pub fn read_chunk_at(&mut self, offset: u64, size: usize) -> io::Result<Vec<u8>> {
        let mut chunk = vec![0u8; size];
        self.read_exact_at(offset, &mut chunk)?;
        Ok(chunk)
    }
}

impl<R: SeekableReader> Read for BufferedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.in_window(self.position, 1) {
            self.fill_window(self.position)?;
            if self.window_len == 0 {
                return Ok(0);
            }
        }
        let start = (self.position - self.window_start) as usize;
        let n = (self.window_len - start).min(buf.len());
        buf[..n].copy_from_slice(&self.buffer[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: SeekableReader> Seek for BufferedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::Current(d) => self.position.checked_add_signed(d),
            SeekFrom::End(d) => self.stream_len()?.checked_add_signed(d),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
        })?;
        self.position = target;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(data: Vec<u8>, capacity: usize) -> BufferedReader<Cursor<Vec<u8>>> {
        BufferedReader::with_capacity(capacity, Cursor::new(data))
    }

    #[test]
    fn test_read_exact_at_scattered_offsets() {
        let data: Vec<u8> = (0..=255).collect();
        let mut r = reader(data, 16);

        assert_eq!(r.read_chunk_at(200, 4).unwrap(), vec![200, 201, 202, 203]);
        assert_eq!(r.read_chunk_at(10, 2).unwrap(), vec![10, 11]);
        assert_eq!(r.read_chunk_at(12, 3).unwrap(), vec![12, 13, 14]);
    }

    #[test]
    fn test_read_larger_than_window_bypasses_buffer() {
        let data: Vec<u8> = (0..100).collect();
        let mut r = reader(data, 8);
        let chunk = r.read_chunk_at(50, 40).unwrap();
        assert_eq!(chunk[0], 50);
        assert_eq!(chunk[39], 89);
    }

    #[test]
    fn test_read_past_end_fails() {
        let mut r = reader(vec![1, 2, 3], 16);
        assert!(r.read_chunk_at(2, 2).is_err());
        assert!(r.read_chunk_at(10, 1).is_err());
    }

    #[test]
    fn test_sequential_reads_and_seek() {
        let data: Vec<u8> = (0..40).collect();
        let mut r = reader(data, 8);

        let mut buf = [0u8; 5];
        r.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3, 4]);

        r.seek(SeekFrom::Current(10)).unwrap();
        r.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [15, 16, 17, 18, 19]);

        r.seek(SeekFrom::End(-2)).unwrap();
        let mut rest = Vec::new();
        r.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, vec![38, 39]);
    }

    #[test]
    fn test_stream_len() {
        let mut r = reader(vec![0; 1234], 16);
        assert_eq!(r.stream_len().unwrap(), 1234);
        assert_eq!(r.get_ref().get_ref().len(), 1234);
    }
}
