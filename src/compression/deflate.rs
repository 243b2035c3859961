//! Deflate/ZIP compression (TIFF codes 8 and 32946)

use crate::error::Result;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Decompresses zlib-wrapped Deflate data
///
/// At most `expected_len` bytes are kept; trailing output is discarded.
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::with_capacity(expected_len);
    decoder.take(expected_len as u64).read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

/// Compresses data with zlib framing at the default level
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
