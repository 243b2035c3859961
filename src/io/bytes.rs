//! Raw byte-range helpers

use std::io::Read;

use tracing::warn;

use crate::error::{Error, Result};

/// How a short read is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// Fail as soon as fewer bytes than requested are available
    #[default]
    Strict,
    /// Log and return an empty result
    Lenient,
}

/// Returns `count` bytes starting at `start`
pub fn slice(bytes: &[u8], start: usize, count: usize) -> Result<&[u8]> {
    start
        .checked_add(count)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| {
            Error::OutOfBounds(format!(
                "slice of {} bytes at {} from a buffer of {}",
                count,
                start,
                bytes.len()
            ))
        })
}

/// Returns the first `count` bytes
pub fn head(bytes: &[u8], count: usize) -> Result<&[u8]> {
    slice(bytes, 0, count)
}

/// Returns everything from `start` on
pub fn tail(bytes: &[u8], start: usize) -> Result<&[u8]> {
    bytes.get(start..).ok_or_else(|| {
        Error::OutOfBounds(format!("tail at {} of a buffer of {}", start, bytes.len()))
    })
}

/// Compares `length` bytes of `a` at `a_start` with `b` at `b_start`
///
/// Ranges that run past either buffer compare unequal.
pub fn compare_bytes(a: &[u8], a_start: usize, b: &[u8], b_start: usize, length: usize) -> bool {
    match (slice(a, a_start, length), slice(b, b_start, length)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

pub fn starts_with(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.starts_with(needle)
}

/// Index of the first NUL byte at or after `start`
pub fn find_null(bytes: &[u8], start: usize) -> Option<usize> {
    bytes
        .get(start..)?
        .iter()
        .position(|&b| b == 0)
        .map(|i| i + start)
}

/// Reads `count` bytes from a stream
///
/// In [`ReadMode::Lenient`] a short stream yields an empty vector and a
/// warning; in [`ReadMode::Strict`] it is an I/O error.
pub fn read_bytes<R: Read + ?Sized>(
    name: &str,
    reader: &mut R,
    count: usize,
    mode: ReadMode,
) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(count.min(1 << 16));
    let read = reader.take(count as u64).read_to_end(&mut buf)?;
    if read == count {
        return Ok(buf);
    }
    match mode {
        ReadMode::Strict => Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("{}: expected {} bytes, stream held {}", name, count, read),
        ))),
        ReadMode::Lenient => {
            warn!(value = name, expected = count, actual = read, "short read, returning empty value");
            Ok(Vec::new())
        }
    }
}

/// Reads `count` bytes and records whether they match `expected`
pub fn read_and_verify<R: Read + ?Sized>(
    name: &str,
    reader: &mut R,
    expected: &[u8],
) -> Result<bool> {
    let actual = read_bytes(name, reader, expected.len(), ReadMode::Strict)?;
    Ok(actual == expected)
}
