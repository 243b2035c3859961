//! Compression and decompression utilities

pub mod deflate;
pub mod lzw;
pub mod packbits;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::ByteOrder;

/// Minimum LZW code size used by TIFF strips and tiles
pub const TIFF_LZW_MIN_CODE_SIZE: u32 = 8;

/// Compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Compression {
    /// No compression
    None,
    /// LZW compression
    Lzw,
    /// Deflate/ZIP compression
    Deflate,
    /// Deflate under the Adobe code (32946)
    AdobeDeflate,
    /// PackBits compression
    PackBits,
}

impl Compression {
    /// Creates compression from TIFF compression tag value
    pub fn from_tag(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Compression::None),
            5 => Ok(Compression::Lzw),
            8 => Ok(Compression::Deflate),
            32946 => Ok(Compression::AdobeDeflate),
            32773 => Ok(Compression::PackBits),
            2 => Err(Error::Unsupported("CCITT 1D compression".to_string())),
            3 => Err(Error::Unsupported("CCITT Group 3 compression".to_string())),
            4 => Err(Error::Unsupported("CCITT Group 4 compression".to_string())),
            6 | 7 => Err(Error::Unsupported("JPEG compression".to_string())),
            _ => Err(Error::Unsupported(format!("Compression type {}", value))),
        }
    }

    /// TIFF compression tag value
    pub fn tag(&self) -> u32 {
        match self {
            Compression::None => 1,
            Compression::Lzw => 5,
            Compression::Deflate => 8,
            Compression::AdobeDeflate => 32946,
            Compression::PackBits => 32773,
        }
    }

    /// Returns the name of this compression type
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Lzw => "LZW",
            Compression::Deflate => "Deflate/ZIP",
            Compression::AdobeDeflate => "Adobe Deflate",
            Compression::PackBits => "PackBits",
        }
    }

    /// Decompresses one strip or tile to `expected_len` bytes
    ///
    /// Uncompressed blocks shorter than `expected_len` are an error; longer
    /// ones are cut. TIFF LZW is always packed most significant bit first.
    pub fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        match self {
            Compression::None => {
                if data.len() < expected_len {
                    return Err(Error::InvalidFormat(format!(
                        "Uncompressed block holds {} bytes, expected {}",
                        data.len(),
                        expected_len
                    )));
                }
                Ok(data[..expected_len].to_vec())
            }
            Compression::Lzw => {
                lzw::decompress(data, TIFF_LZW_MIN_CODE_SIZE, ByteOrder::BigEndian, expected_len)
            }
            Compression::Deflate | Compression::AdobeDeflate => {
                deflate::decompress(data, expected_len)
            }
            Compression::PackBits => packbits::decompress(data, expected_len),
        }
    }

    /// Compresses one block with this scheme
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Lzw => lzw::compress(data, TIFF_LZW_MIN_CODE_SIZE, ByteOrder::BigEndian, true),
            Compression::Deflate | Compression::AdobeDeflate => deflate::compress(data),
            Compression::PackBits => Ok(packbits::compress(data)),
        }
    }
}
