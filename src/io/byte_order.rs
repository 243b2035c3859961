//! Byte order (endianness) handling
//!
//! Provides pure conversions between byte slices and typed values in either
//! byte order, plus stream readers that consume exactly the number of bytes
//! a value needs.

use std::io::{self, Read};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::RationalNumber;

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    /// The two marker bytes that announce this byte order
    pub fn tiff_magic(self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    /// Reads and detects byte order from a reader
    ///
    /// Both marker bytes must be identical and one of the recognised values.
    pub fn detect<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic)?;

        Self::from_tiff_magic(magic)
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes(magic)))
    }

    /// Creates a stream handler for this byte order
    pub fn handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndian),
            ByteOrder::BigEndian => Box::new(BigEndian),
        }
    }

    /// Returns a short human readable name
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "little-endian (II)",
            ByteOrder::BigEndian => "big-endian (MM)",
        }
    }

    fn take<const N: usize>(bytes: &[u8], start: usize) -> Result<[u8; N]> {
        start
            .checked_add(N)
            .and_then(|end| bytes.get(start..end))
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                Error::OutOfBounds(format!(
                    "need {} bytes at {}, buffer holds {}",
                    N,
                    start,
                    bytes.len()
                ))
            })
    }

    pub fn decode_u16(self, bytes: &[u8], start: usize) -> Result<u16> {
        let b = Self::take::<2>(bytes, start)?;
        Ok(match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(b),
            ByteOrder::BigEndian => u16::from_be_bytes(b),
        })
    }

    pub fn decode_i16(self, bytes: &[u8], start: usize) -> Result<i16> {
        Ok(self.decode_u16(bytes, start)? as i16)
    }

    pub fn decode_u32(self, bytes: &[u8], start: usize) -> Result<u32> {
        let b = Self::take::<4>(bytes, start)?;
        Ok(match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        })
    }

    pub fn decode_i32(self, bytes: &[u8], start: usize) -> Result<i32> {
        Ok(self.decode_u32(bytes, start)? as i32)
    }

    pub fn decode_f32(self, bytes: &[u8], start: usize) -> Result<f32> {
        Ok(f32::from_bits(self.decode_u32(bytes, start)?))
    }

    pub fn decode_f64(self, bytes: &[u8], start: usize) -> Result<f64> {
        let b = Self::take::<8>(bytes, start)?;
        Ok(match self {
            ByteOrder::LittleEndian => f64::from_le_bytes(b),
            ByteOrder::BigEndian => f64::from_be_bytes(b),
        })
    }

    /// Decodes an 8-byte rational (numerator then divisor)
    ///
    /// Unsigned rationals whose halves exceed `i32::MAX` are scaled down
    /// through [`RationalNumber::new_safe`].
    pub fn decode_rational(self, bytes: &[u8], start: usize, unsigned: bool) -> Result<RationalNumber> {
        if unsigned {
            let numerator = self.decode_u32(bytes, start)?;
            let divisor = self.decode_u32(bytes, start + 4)?;
            if numerator <= i32::MAX as u32 && divisor <= i32::MAX as u32 {
                return Ok(RationalNumber::new(numerator as i32, divisor as i32));
            }
            return RationalNumber::new_safe(numerator as i64, divisor as i64);
        }
        let numerator = self.decode_i32(bytes, start)?;
        let divisor = self.decode_i32(bytes, start + 4)?;
        Ok(RationalNumber::new(numerator, divisor))
    }

    fn decode_array<T>(
        self,
        bytes: &[u8],
        start: usize,
        count: usize,
        width: usize,
        decode: impl Fn(Self, &[u8], usize) -> Result<T>,
    ) -> Result<Vec<T>> {
        let needed = count
            .checked_mul(width)
            .and_then(|n| n.checked_add(start))
            .ok_or_else(|| Error::OutOfBounds(format!("array of {} x {} bytes", count, width)))?;
        if needed > bytes.len() {
            return Err(Error::OutOfBounds(format!(
                "need {} bytes for {} values, buffer holds {}",
                needed,
                count,
                bytes.len()
            )));
        }
        (0..count).map(|i| decode(self, bytes, start + i * width)).collect()
    }

    pub fn decode_u16_array(self, bytes: &[u8], start: usize, count: usize) -> Result<Vec<u16>> {
        self.decode_array(bytes, start, count, 2, Self::decode_u16)
    }

    pub fn decode_i16_array(self, bytes: &[u8], start: usize, count: usize) -> Result<Vec<i16>> {
        self.decode_array(bytes, start, count, 2, Self::decode_i16)
    }

    pub fn decode_u32_array(self, bytes: &[u8], start: usize, count: usize) -> Result<Vec<u32>> {
        self.decode_array(bytes, start, count, 4, Self::decode_u32)
    }

    pub fn decode_i32_array(self, bytes: &[u8], start: usize, count: usize) -> Result<Vec<i32>> {
        self.decode_array(bytes, start, count, 4, Self::decode_i32)
    }

    pub fn decode_f32_array(self, bytes: &[u8], start: usize, count: usize) -> Result<Vec<f32>> {
        self.decode_array(bytes, start, count, 4, Self::decode_f32)
    }

    pub fn decode_f64_array(self, bytes: &[u8], start: usize, count: usize) -> Result<Vec<f64>> {
        self.decode_array(bytes, start, count, 8, Self::decode_f64)
    }

    pub fn decode_rational_array(
        self,
        bytes: &[u8],
        start: usize,
        count: usize,
        unsigned: bool,
    ) -> Result<Vec<RationalNumber>> {
        self.decode_array(bytes, start, count, 8, |order, b, s| {
            order.decode_rational(b, s, unsigned)
        })
    }

    pub fn encode_u16(self, value: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    pub fn encode_i16(self, value: i16) -> [u8; 2] {
        self.encode_u16(value as u16)
    }

    pub fn encode_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    pub fn encode_i32(self, value: i32) -> [u8; 4] {
        self.encode_u32(value as u32)
    }

    pub fn encode_f32(self, value: f32) -> [u8; 4] {
        self.encode_u32(value.to_bits())
    }

    pub fn encode_f64(self, value: f64) -> [u8; 8] {
        match self {
            ByteOrder::LittleEndian => value.to_le_bytes(),
            ByteOrder::BigEndian => value.to_be_bytes(),
        }
    }

    pub fn encode_rational(self, value: RationalNumber) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..4].copy_from_slice(&self.encode_i32(value.numerator));
        out[4..].copy_from_slice(&self.encode_i32(value.divisor));
        out
    }

    pub fn encode_u16_array(self, values: &[u16]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_u16(v)).collect()
    }

    pub fn encode_i16_array(self, values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_i16(v)).collect()
    }

    pub fn encode_f32_array(self, values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_f32(v)).collect()
    }

    pub fn encode_i32_array(self, values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_i32(v)).collect()
    }

    pub fn encode_u32_array(self, values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_u32(v)).collect()
    }

    pub fn encode_f64_array(self, values: &[f64]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_f64(v)).collect()
    }

    pub fn encode_rational_array(self, values: &[RationalNumber]) -> Vec<u8> {
        values.iter().flat_map(|&v| self.encode_rational(v)).collect()
    }
}

/// Trait for reading typed values with specific byte order
///
/// Every read consumes exactly the width of the value or fails with an
/// I/O error; there is no partial success.
pub trait ByteOrderHandler: Send + Sync {
    /// The byte order this handler decodes
    fn order(&self) -> ByteOrder;

    /// Reads an unsigned 8-bit integer
    fn read_u8(&self, reader: &mut dyn Read) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    /// Reads an unsigned 16-bit integer
    fn read_u16(&self, reader: &mut dyn Read) -> io::Result<u16>;

    /// Reads an unsigned 32-bit integer
    fn read_u32(&self, reader: &mut dyn Read) -> io::Result<u32>;

    /// Reads a signed 16-bit integer
    fn read_i16(&self, reader: &mut dyn Read) -> io::Result<i16> {
        Ok(self.read_u16(reader)? as i16)
    }

    /// Reads a signed 32-bit integer
    fn read_i32(&self, reader: &mut dyn Read) -> io::Result<i32> {
        Ok(self.read_u32(reader)? as i32)
    }

    /// Reads a 32-bit floating point number
    fn read_f32(&self, reader: &mut dyn Read) -> io::Result<f32> {
        Ok(f32::from_bits(self.read_u32(reader)?))
    }

    /// Reads a 64-bit floating point number
    fn read_f64(&self, reader: &mut dyn Read) -> io::Result<f64>;

    /// Reads a signed rational (two 32-bit integers)
    fn read_rational(&self, reader: &mut dyn Read) -> io::Result<RationalNumber> {
        let numerator = self.read_i32(reader)?;
        let divisor = self.read_i32(reader)?;
        Ok(RationalNumber::new(numerator, divisor))
    }
}

struct LittleEndian;

impl ByteOrderHandler for LittleEndian {
    fn order(&self) -> ByteOrder {
        ByteOrder::LittleEndian
    }

    fn read_u16(&self, reader: &mut dyn Read) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }

    fn read_u32(&self, reader: &mut dyn Read) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_f64(&self, reader: &mut dyn Read) -> io::Result<f64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }
}

struct BigEndian;

impl ByteOrderHandler for BigEndian {
    fn order(&self) -> ByteOrder {
        ByteOrder::BigEndian
    }

    fn read_u16(&self, reader: &mut dyn Read) -> io::Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_u32(&self, reader: &mut dyn Read) -> io::Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_f64(&self, reader: &mut dyn Read) -> io::Result<f64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(f64::from_be_bytes(buf))
    }
}
