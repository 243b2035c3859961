//! LZW compression and decompression
//!
//! LZW (Lempel-Ziv-Welch) is a lossless compression algorithm used in TIFF files.
//! Codes start one bit wider than the minimum code size and grow up to 12
//! bits. The clear code is `1 << min_code_size` and end-of-information is the
//! code after it. In TIFF ("early change") mode the width grows one code
//! early, and running out of input counts as end-of-information.
//!
//! Big-endian order packs codes most significant bit first (TIFF);
//! little-endian packs them least significant bit first (GIF).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::io::ByteOrder;

const MAX_CODE_SIZE: u32 = 12;
const MAX_CODES: usize = 1 << MAX_CODE_SIZE;

/// Decompresses TIFF-mode LZW data, stopping once `expected_len` bytes are produced
pub fn decompress(
    data: &[u8],
    min_code_size: u32,
    order: ByteOrder,
    expected_len: usize,
) -> Result<Vec<u8>> {
    LzwDecoder::new(min_code_size, order)?.decode(data, expected_len)
}

/// Compresses data, emitting a leading clear code and a trailing end code
pub fn compress(
    data: &[u8],
    min_code_size: u32,
    order: ByteOrder,
    early_limit: bool,
) -> Result<Vec<u8>> {
    LzwEncoder::new(min_code_size, order, early_limit)?.encode(data)
}

fn check_min_code_size(min_code_size: u32) -> Result<()> {
    if (2..=8).contains(&min_code_size) {
        Ok(())
    } else {
        Err(Error::InvalidFormat(format!(
            "LZW: unsupported minimum code size {}",
            min_code_size
        )))
    }
}

/// LZW decoder
pub struct LzwDecoder {
    dictionary: Vec<Vec<u8>>,
    min_code_size: u32,
    code_size: u32,
    clear_code: usize,
    eoi_code: usize,
    order: ByteOrder,
    tiff_mode: bool,
}

impl LzwDecoder {
    /// Creates a TIFF-mode decoder
    pub fn new(min_code_size: u32, order: ByteOrder) -> Result<Self> {
        check_min_code_size(min_code_size)?;
        let clear_code = 1 << min_code_size;

        let mut decoder = Self {
            dictionary: (0..clear_code).map(|i| vec![i as u8]).collect(),
            min_code_size,
            code_size: min_code_size + 1,
            clear_code,
            eoi_code: clear_code + 1,
            order,
            tiff_mode: true,
        };
        decoder.reset();
        Ok(decoder)
    }

    /// Switches between TIFF early change and plain (GIF) code growth
    pub fn with_tiff_mode(mut self, tiff_mode: bool) -> Self {
        self.tiff_mode = tiff_mode;
        self
    }

    pub fn decode(&mut self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(expected_len);
        let mut reader = BitReader::new(data, self.order);
        let mut previous: Option<usize> = None;
        self.reset();

        while output.len() < expected_len {
            let code = self.next_code(&mut reader)?;

            if code == self.eoi_code {
                break;
            }

            if code == self.clear_code {
                self.reset();
                previous = None;
                continue;
            }

            let entry = match previous {
                None => self.entry(code)?.to_vec(),
                Some(prev) => {
                    let entry = if code < self.dictionary.len() {
                        self.dictionary[code].clone()
                    } else if code == self.dictionary.len() {
                        let mut entry = self.dictionary[prev].clone();
                        entry.push(first_byte(&entry)?);
                        entry
                    } else {
                        return Err(self.bad_code(code));
                    };

                    let mut added = self.dictionary[prev].clone();
                    added.push(first_byte(&entry)?);
                    self.add_entry(added);
                    entry
                }
            };

            output.extend_from_slice(&entry);
            previous = Some(code);
        }

        output.truncate(expected_len);
        Ok(output)
    }

    fn next_code(&self, reader: &mut BitReader) -> Result<usize> {
        match reader.read_bits(self.code_size) {
            Some(code) => Ok(code),
            None if self.tiff_mode => Ok(self.eoi_code),
            None => Err(Error::InvalidFormat("LZW: premature end of data".to_string())),
        }
    }

    fn entry(&self, code: usize) -> Result<&[u8]> {
        match self.dictionary.get(code) {
            Some(entry) if !entry.is_empty() => Ok(entry),
            _ => Err(self.bad_code(code)),
        }
    }

    fn bad_code(&self, code: usize) -> Error {
        Error::InvalidFormat(format!(
            "LZW: bad code {} (codes: {}, code size: {})",
            code,
            self.dictionary.len(),
            self.code_size
        ))
    }

    fn add_entry(&mut self, entry: Vec<u8>) {
        // A full table stops growing until the next clear code.
        if self.dictionary.len() < MAX_CODES {
            self.dictionary.push(entry);
        }

        let mut limit = 1 << self.code_size;
        if self.tiff_mode {
            limit -= 1;
        }
        if self.dictionary.len() == limit && self.code_size < MAX_CODE_SIZE {
            self.code_size += 1;
        }
    }

    fn reset(&mut self) {
        self.dictionary.truncate(self.clear_code);
        // Placeholders for the clear and end-of-information codes.
        self.dictionary.push(Vec::new());
        self.dictionary.push(Vec::new());
        self.code_size = self.min_code_size + 1;
    }
}

fn first_byte(entry: &[u8]) -> Result<u8> {
    entry
        .first()
        .copied()
        .ok_or_else(|| Error::InvalidFormat("LZW: empty table entry".to_string()))
}

/// LZW encoder
///
/// The string table is a trie keyed by `(prefix code, next byte)`.
pub struct LzwEncoder {
    table: HashMap<(usize, u8), usize>,
    next_code: usize,
    min_code_size: u32,
    code_size: u32,
    clear_code: usize,
    eoi_code: usize,
    order: ByteOrder,
    early_limit: bool,
}

impl LzwEncoder {
    pub fn new(min_code_size: u32, order: ByteOrder, early_limit: bool) -> Result<Self> {
        check_min_code_size(min_code_size)?;
        let clear_code = 1 << min_code_size;
        Ok(Self {
            table: HashMap::new(),
            next_code: clear_code + 2,
            min_code_size,
            code_size: min_code_size + 1,
            clear_code,
            eoi_code: clear_code + 1,
            order,
            early_limit,
        })
    }

    pub fn encode(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new(self.order, data.len() / 2 + 4);
        self.reset();
        writer.write_bits(self.clear_code, self.code_size);

        let mut current: Option<usize> = None;
        for &byte in data {
            if byte as usize >= self.clear_code {
                return Err(Error::InvalidFormat(format!(
                    "LZW: byte {} does not fit a {}-bit minimum code size",
                    byte, self.min_code_size
                )));
            }

            current = Some(match current {
                None => byte as usize,
                Some(prefix) => match self.table.get(&(prefix, byte)) {
                    Some(&code) => code,
                    None => {
                        writer.write_bits(prefix, self.code_size);
                        self.add_entry(&mut writer, prefix, byte);
                        byte as usize
                    }
                },
            });
        }

        if let Some(code) = current {
            writer.write_bits(code, self.code_size);
        }
        writer.write_bits(self.eoi_code, self.code_size);
        Ok(writer.finish())
    }

    fn add_entry(&mut self, writer: &mut BitWriter, prefix: usize, byte: u8) {
        let mut limit = 1 << self.code_size;
        if self.early_limit {
            limit -= 1;
        }

        if self.next_code == limit {
            if self.code_size < MAX_CODE_SIZE {
                self.code_size += 1;
            } else {
                writer.write_bits(self.clear_code, self.code_size);
                self.reset();
                return;
            }
        }

        self.table.insert((prefix, byte), self.next_code);
        self.next_code += 1;
    }

    fn reset(&mut self) {
        self.table.clear();
        self.next_code = self.clear_code + 2;
        self.code_size = self.min_code_size + 1;
    }
}

/// Reads variable-length bit codes from byte stream
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    cache: u32,
    bits: u32,
    order: ByteOrder,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self {
            data,
            position: 0,
            cache: 0,
            bits: 0,
            order,
        }
    }

    fn read_bits(&mut self, count: u32) -> Option<usize> {
        while self.bits < count {
            let byte = *self.data.get(self.position)? as u32;
            self.position += 1;
            match self.order {
                ByteOrder::BigEndian => self.cache = (self.cache << 8) | byte,
                ByteOrder::LittleEndian => self.cache |= byte << self.bits,
            }
            self.bits += 8;
        }

        let mask = (1u32 << count) - 1;
        let sample = match self.order {
            ByteOrder::BigEndian => (self.cache >> (self.bits - count)) & mask,
            ByteOrder::LittleEndian => {
                let sample = self.cache & mask;
                self.cache >>= count;
                sample
            }
        };
        self.bits -= count;
        self.cache &= (1u32 << self.bits) - 1;
        Some(sample as usize)
    }
}

/// Packs variable-length bit codes into bytes
struct BitWriter {
    output: Vec<u8>,
    cache: u32,
    bits: u32,
    order: ByteOrder,
}

impl BitWriter {
    fn new(order: ByteOrder, capacity: usize) -> Self {
        Self {
            output: Vec::with_capacity(capacity),
            cache: 0,
            bits: 0,
            order,
        }
    }

    fn write_bits(&mut self, value: usize, count: u32) {
        let value = value as u32 & ((1u32 << count) - 1);
        match self.order {
            ByteOrder::BigEndian => self.cache = (self.cache << count) | value,
            ByteOrder::LittleEndian => self.cache |= value << self.bits,
        }
        self.bits += count;

        while self.bits >= 8 {
            match self.order {
                ByteOrder::BigEndian => self.output.push((self.cache >> (self.bits - 8)) as u8),
                ByteOrder::LittleEndian => {
                    self.output.push(self.cache as u8);
                    self.cache >>= 8;
                }
            }
            self.bits -= 8;
            self.cache &= (1u32 << self.bits) - 1;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            let mut last = self.cache & ((1u32 << self.bits) - 1);
            if self.order == ByteOrder::BigEndian {
                last <<= 8 - self.bits;
            }
            self.output.push(last as u8);
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bit_reader() {
        let data = vec![0b11010010, 0b10110101];
        let mut reader = BitReader::new(&data, ByteOrder::LittleEndian);
        assert_eq!(reader.read_bits(3), Some(0b010));
        assert_eq!(reader.read_bits(5), Some(0b11010));

        let mut reader = BitReader::new(&data, ByteOrder::BigEndian);
        assert_eq!(reader.read_bits(3), Some(0b110));
        assert_eq!(reader.read_bits(9), Some(0b100101011));
        assert_eq!(reader.read_bits(8), None);
    }

    #[test]
    fn test_bit_writer_round_trip() {
        for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
            let mut writer = BitWriter::new(order, 8);
            writer.write_bits(0x1FF, 9);
            writer.write_bits(0x5, 3);
            writer.write_bits(0xABC, 12);
            let bytes = writer.finish();
            assert_eq!(bytes.len(), 3);

            let mut reader = BitReader::new(&bytes, order);
            assert_eq!(reader.read_bits(9), Some(0x1FF));
            assert_eq!(reader.read_bits(3), Some(0x5));
            assert_eq!(reader.read_bits(12), Some(0xABC));
        }
    }

    #[test]
    fn test_empty_input() {
        let packed = compress(&[], 8, ByteOrder::BigEndian, true).unwrap();
        assert_eq!(packed, vec![0x80, 0x40, 0x40]);
        assert!(decompress(&packed, 8, ByteOrder::BigEndian, 0).unwrap().is_empty());
    }

    #[test]
    fn test_single_byte_vector() {
        let packed = compress(b"A", 8, ByteOrder::BigEndian, true).unwrap();
        assert_eq!(packed, vec![0x80, 0x10, 0x60, 0x20]);
        assert_eq!(decompress(&packed, 8, ByteOrder::BigEndian, 1).unwrap(), b"A");
    }

    #[test]
    fn test_end_of_input_acts_as_end_code() {
        let truncated = [0x80, 0x10, 0x60];
        assert_eq!(decompress(&truncated, 8, ByteOrder::BigEndian, 10).unwrap(), b"A");

        let mut decoder = LzwDecoder::new(8, ByteOrder::BigEndian)
            .unwrap()
            .with_tiff_mode(false);
        assert!(decoder.decode(&truncated, 10).is_err());
    }

    #[test]
    fn test_repetitive_data_compresses() {
        let data = b"TOBEORNOTTOBEORTOBEORNOT".repeat(20);
        let packed = compress(&data, 8, ByteOrder::BigEndian, true).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, 8, ByteOrder::BigEndian, data.len()).unwrap(), data);
    }

    #[test]
    fn test_table_overflow_emits_clear_code() {
        // Enough distinct pairs to fill the 12-bit table several times.
        let data: Vec<u8> = (0..40_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        for early in [true, false] {
            let packed = compress(&data, 8, ByteOrder::BigEndian, early).unwrap();
            let mut decoder = LzwDecoder::new(8, ByteOrder::BigEndian)
                .unwrap()
                .with_tiff_mode(early);
            assert_eq!(decoder.decode(&packed, data.len()).unwrap(), data);
        }
    }

    #[test]
    fn test_small_code_size_little_endian() {
        let data = vec![0u8, 1, 2, 3, 3, 3, 3, 2, 1, 0, 0, 0];
        let packed = compress(&data, 2, ByteOrder::LittleEndian, false).unwrap();
        let mut decoder = LzwDecoder::new(2, ByteOrder::LittleEndian)
            .unwrap()
            .with_tiff_mode(false);
        assert_eq!(decoder.decode(&packed, data.len()).unwrap(), data);

        assert!(compress(&[4], 2, ByteOrder::LittleEndian, false).is_err());
    }

    #[test]
    fn test_invalid_code_size_and_bad_code() {
        assert!(LzwDecoder::new(1, ByteOrder::BigEndian).is_err());
        assert!(LzwEncoder::new(9, ByteOrder::BigEndian, true).is_err());

        // clear, then code 300 which is not yet in the table
        let mut writer = BitWriter::new(ByteOrder::BigEndian, 4);
        writer.write_bits(256, 9);
        writer.write_bits(300, 9);
        let bytes = writer.finish();
        assert!(decompress(&bytes, 8, ByteOrder::BigEndian, 4).is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip_tiff(data in proptest::collection::vec(any::<u8>(), 0..2000)) {
            let packed = compress(&data, 8, ByteOrder::BigEndian, true).unwrap();
            prop_assert_eq!(decompress(&packed, 8, ByteOrder::BigEndian, data.len()).unwrap(), data);
        }

        #[test]
        fn prop_round_trip_little_endian(data in proptest::collection::vec(0u8..16, 0..2000)) {
            let packed = compress(&data, 8, ByteOrder::LittleEndian, true).unwrap();
            prop_assert_eq!(decompress(&packed, 8, ByteOrder::LittleEndian, data.len()).unwrap(), data);
        }
    }
}
