//! Error types for tiffscope

use std::io;
use thiserror::Error;

/// Result type for tiffscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structurally invalid or inconsistent content
    Format,
    /// Short read or unreachable byte range in the underlying source
    Io,
}

/// Error types that can occur while reading a TIFF container
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A byte range that lies (partly) outside the byte source
    #[error("Range out of bounds: requested {length} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        length: u64,
        size: u64,
    },

    /// Invalid TIFF format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Invalid byte order marker
    #[error("Invalid byte order: 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Version field is not 42
    #[error("Invalid TIFF version: expected 42, got {0}")]
    InvalidVersion(u16),

    /// Missing required tag
    #[error("Missing required tag: {0}")]
    MissingTag(u16),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid directory or value offset
    #[error("Invalid offset: {0}")]
    InvalidOffset(u64),

    /// Out of bounds access inside a byte buffer
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Deviation raised by a strict format compliance log
    #[error("Format compliance: {0}")]
    Compliance(String),
}

impl Error {
    /// Returns whether this is a format or an I/O error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::RangeOutOfBounds { .. } => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFormat("test".to_string());
        assert_eq!(err.to_string(), "Invalid format: test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "short read");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_invalid_byte_order() {
        let err = Error::InvalidByteOrder(0x1234);
        assert!(err.to_string().contains("0x1234"));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_range_out_of_bounds_is_io() {
        let err = Error::RangeOutOfBounds { offset: 10, length: 4, size: 12 };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("size is 12"));
    }

    #[test]
    fn test_missing_tag() {
        let err = Error::MissingTag(256);
        assert!(err.to_string().contains("256"));
    }
}
