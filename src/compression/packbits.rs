//! PackBits compression and decompression
//!
//! PackBits is a simple run-length encoding scheme used in TIFF files.
//! Each chunk starts with a signed control byte `n`:
//! - `0..=127`: copy the next `n + 1` bytes literally
//! - `-127..=-1`: repeat the next byte `1 - n` times
//! - `-128`: illegal

use crate::error::{Error, Result};

const MAX_CHUNK: usize = 128;

/// Decompresses PackBits data until exactly `expected` bytes are produced
///
/// A final chunk that overshoots `expected` is truncated. Running out of
/// input first is an error naming how far decoding got.
pub fn decompress(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(expected);
    let mut pos = 0;

    while output.len() < expected {
        let Some(&control) = data.get(pos) else {
            return Err(Error::InvalidFormat(format!(
                "PackBits: source exhausted after {} bytes, produced {} of {} expected",
                pos,
                output.len(),
                expected
            )));
        };
        pos += 1;
        let header = control as i8;

        match header {
            -128 => {
                return Err(Error::InvalidFormat(format!(
                    "PackBits: illegal control byte -128 at {}",
                    pos - 1
                )));
            }

            0..=127 => {
                let count = header as usize + 1;
                let Some(literal) = data.get(pos..pos + count) else {
                    return Err(Error::InvalidFormat(format!(
                        "PackBits: literal of {} bytes at {} runs past the {} input bytes, produced {} of {} expected",
                        count,
                        pos,
                        data.len(),
                        output.len(),
                        expected
                    )));
                };
                output.extend_from_slice(literal);
                pos += count;
            }

            -127..=-1 => {
                let Some(&byte) = data.get(pos) else {
                    return Err(Error::InvalidFormat(format!(
                        "PackBits: missing run byte at {}, produced {} of {} expected",
                        pos,
                        output.len(),
                        expected
                    )));
                };
                pos += 1;
                let count = (1 - header as isize) as usize;
                output.resize(output.len() + count, byte);
            }
        }
    }

    output.truncate(expected);
    Ok(output)
}

/// Compresses data with PackBits
///
/// Runs of two or more identical bytes become run chunks. A run shorter
/// than three bytes that follows a literal span is folded into the literal,
/// unless another run starts right after it.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len() + data.len() / MAX_CHUNK + 1);
    let mut ptr = 0;

    while ptr < data.len() {
        let mut dup = find_next_duplicate(data, ptr);

        if dup == Some(ptr) {
            let len = find_run_length(data, ptr).min(MAX_CHUNK);
            output.push((1 - len as isize) as i8 as u8);
            output.push(data[ptr]);
            ptr += len;
            continue;
        }

        if let Some(run_start) = dup {
            let run_len = find_run_length(data, run_start);
            if run_len < 3 {
                let next_ptr = run_start + run_len;
                let next_dup = find_next_duplicate(data, next_ptr);
                if next_dup != Some(next_ptr) {
                    dup = next_dup;
                }
            }
        }

        let len = match dup {
            Some(run_start) => run_start - ptr,
            None => data.len() - ptr,
        }
        .min(MAX_CHUNK);
        output.push((len - 1) as u8);
        output.extend_from_slice(&data[ptr..ptr + len]);
        ptr += len;
    }

    output
}

/// Index of the first byte at or after `start` that equals its successor
fn find_next_duplicate(data: &[u8], start: usize) -> Option<usize> {
    data.get(start..)?
        .windows(2)
        .position(|w| w[0] == w[1])
        .map(|i| i + start)
}

fn find_run_length(data: &[u8], start: usize) -> usize {
    let byte = data[start];
    data[start..].iter().take_while(|&&b| b == byte).count()
}
