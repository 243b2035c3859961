//! Byte source implementations
//!
//! A byte source is the only way the directory reader touches the container:
//! it fetches blocks by absolute offset and reports the total length.

use std::cell::RefCell;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use memmap2::Mmap;

use crate::error::Result;
use crate::io::traits::check_range;
use crate::io::{BufferedReader, ByteSource, SeekableReader};

/// Byte source over an in-memory buffer
#[derive(Debug, Clone)]
pub struct ByteSourceArray {
    bytes: Vec<u8>,
    filename: Option<String>,
}

impl ByteSourceArray {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, filename: None }
    }

    pub fn with_filename(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: Some(filename.into()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl ByteSource for ByteSourceArray {
    fn len(&self) -> Result<u64> {
        Ok(self.bytes.len() as u64)
    }

    fn block(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        check_range(offset, length, self.bytes.len() as u64)?;
        let start = offset as usize;
        Ok(self.bytes[start..start + length].to_vec())
    }

    fn stream(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(self.bytes.as_slice())))
    }

    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}

/// Byte source over a memory-mapped file
pub struct ByteSourceFile {
    mmap: Mmap,
    filename: Option<String>,
}

impl ByteSourceFile {
    /// Maps the file at `path` read-only
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: read-only mapping; the file must not be truncated while mapped.
        let mmap = unsafe { Mmap::map(&file)? };

        // Directory walks jump between offsets, read-ahead rarely helps.
        #[cfg(unix)]
        unsafe {
            if !mmap.is_empty() {
                libc::madvise(
                    mmap.as_ptr() as *mut libc::c_void,
                    mmap.len(),
                    libc::MADV_RANDOM,
                );
            }
        }

        Ok(Self {
            mmap,
            filename: path.file_name().map(|n| n.to_string_lossy().into_owned()),
        })
    }
}

impl ByteSource for ByteSourceFile {
    fn len(&self) -> Result<u64> {
        Ok(self.mmap.len() as u64)
    }

    fn block(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        check_range(offset, length, self.mmap.len() as u64)?;
        let start = offset as usize;
        Ok(self.mmap[start..start + length].to_vec())
    }

    fn stream(&self) -> Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(&self.mmap[..])))
    }

    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}

/// Byte source over any seekable reader
///
/// Reads go through a [`BufferedReader`] window; the reader is borrowed
/// mutably per request, so the source itself is used through `&self`.
pub struct ByteSourceReader<R: SeekableReader> {
    reader: RefCell<BufferedReader<R>>,
    length: u64,
    filename: Option<String>,
}

impl<R: SeekableReader> ByteSourceReader<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = BufferedReader::new(reader);
        let length = reader.stream_len()?;
        Ok(Self {
            reader: RefCell::new(reader),
            length,
            filename: None,
        })
    }

    pub fn with_filename(reader: R, filename: impl Into<String>) -> Result<Self> {
        let mut source = Self::new(reader)?;
        source.filename = Some(filename.into());
        Ok(source)
    }
}

impl<R: SeekableReader> ByteSource for ByteSourceReader<R> {
    fn len(&self) -> Result<u64> {
        Ok(self.length)
    }

    fn block(&self, offset: u64, length: usize) -> Result<Vec<u8>> {
        check_range(offset, length, self.length)?;
        Ok(self.reader.borrow_mut().read_chunk_at(offset, length)?)
    }

    fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }
}
