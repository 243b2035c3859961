//! TIFF field types and decoded field values

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::RationalNumber;

/// Bytes available for an inline value in a classic TIFF entry
pub const INLINE_VALUE_SIZE: usize = 4;

/// Numeric field type of a directory entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldType {
    /// BYTE (8-bit unsigned)
    Byte,
    /// ASCII, NUL terminated
    Ascii,
    /// SHORT (16-bit unsigned)
    Short,
    /// LONG (32-bit unsigned)
    Long,
    /// RATIONAL (two LONGs: numerator, denominator)
    Rational,
    /// SBYTE (8-bit signed)
    SByte,
    /// UNDEFINED (8-bit opaque)
    Undefined,
    /// SSHORT (16-bit signed)
    SShort,
    /// SLONG (32-bit signed)
    SLong,
    /// SRATIONAL (two SLONGs)
    SRational,
    /// FLOAT (32-bit IEEE float)
    Float,
    /// DOUBLE (64-bit IEEE double)
    Double,
    /// IFD (32-bit directory offset)
    Ifd,
    /// Any other type code; the raw bytes are kept
    Unknown(u16),
}

/// Every known type, in code order
pub const ANY: &[FieldType] = &[
    FieldType::Byte,
    FieldType::Ascii,
    FieldType::Short,
    FieldType::Long,
    FieldType::Rational,
    FieldType::SByte,
    FieldType::Undefined,
    FieldType::SShort,
    FieldType::SLong,
    FieldType::SRational,
    FieldType::Float,
    FieldType::Double,
    FieldType::Ifd,
];
pub const BYTE: &[FieldType] = &[FieldType::Byte];
pub const ASCII: &[FieldType] = &[FieldType::Ascii];
pub const SHORT: &[FieldType] = &[FieldType::Short];
pub const LONG: &[FieldType] = &[FieldType::Long];
pub const SHORT_OR_LONG: &[FieldType] = &[FieldType::Short, FieldType::Long];
pub const LONG_OR_IFD: &[FieldType] = &[FieldType::Long, FieldType::Ifd];
pub const RATIONAL: &[FieldType] = &[FieldType::Rational];
pub const SRATIONAL: &[FieldType] = &[FieldType::SRational];
pub const UNDEFINED: &[FieldType] = &[FieldType::Undefined];
pub const DOUBLE: &[FieldType] = &[FieldType::Double];
pub const BYTE_OR_UNDEFINED: &[FieldType] = &[FieldType::Byte, FieldType::Undefined];

impl FieldType {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => FieldType::Byte,
            2 => FieldType::Ascii,
            3 => FieldType::Short,
            4 => FieldType::Long,
            5 => FieldType::Rational,
            6 => FieldType::SByte,
            7 => FieldType::Undefined,
            8 => FieldType::SShort,
            9 => FieldType::SLong,
            10 => FieldType::SRational,
            11 => FieldType::Float,
            12 => FieldType::Double,
            13 => FieldType::Ifd,
            other => FieldType::Unknown(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            FieldType::Byte => 1,
            FieldType::Ascii => 2,
            FieldType::Short => 3,
            FieldType::Long => 4,
            FieldType::Rational => 5,
            FieldType::SByte => 6,
            FieldType::Undefined => 7,
            FieldType::SShort => 8,
            FieldType::SLong => 9,
            FieldType::SRational => 10,
            FieldType::Float => 11,
            FieldType::Double => 12,
            FieldType::Ifd => 13,
            FieldType::Unknown(code) => *code,
        }
    }

    /// Width in bytes of one element; unknown types count as bytes
    pub fn unit_size(&self) -> usize {
        match self {
            FieldType::Byte
            | FieldType::Ascii
            | FieldType::SByte
            | FieldType::Undefined
            | FieldType::Unknown(_) => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
        }
    }

    /// Total byte length of `count` elements, `None` on overflow
    pub fn byte_length(&self, count: u32) -> Option<usize> {
        (count as usize).checked_mul(self.unit_size())
    }

    /// Whether `count` elements fit in the 4 inline bytes of an entry
    pub fn fits_inline(&self, count: u32) -> bool {
        matches!(self.byte_length(count), Some(n) if n <= INLINE_VALUE_SIZE)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Byte => "Byte",
            FieldType::Ascii => "ASCII",
            FieldType::Short => "Short",
            FieldType::Long => "Long",
            FieldType::Rational => "Rational",
            FieldType::SByte => "SByte",
            FieldType::Undefined => "Undefined",
            FieldType::SShort => "SShort",
            FieldType::SLong => "SLong",
            FieldType::SRational => "SRational",
            FieldType::Float => "Float",
            FieldType::Double => "Double",
            FieldType::Ifd => "IFD",
            FieldType::Unknown(_) => "Unknown",
        }
    }

    /// Decodes `count` elements from the start of `bytes`
    pub fn decode(&self, bytes: &[u8], count: usize, order: ByteOrder) -> Result<FieldValue> {
        let value = match self {
            FieldType::Byte => FieldValue::Bytes(raw(bytes, count)?.to_vec()),
            FieldType::SByte => {
                FieldValue::SBytes(raw(bytes, count)?.iter().map(|&b| b as i8).collect())
            }
            FieldType::Undefined => FieldValue::Undefined(raw(bytes, count)?.to_vec()),
            FieldType::Ascii => FieldValue::Ascii(decode_ascii(raw(bytes, count)?)),
            FieldType::Short => FieldValue::Shorts(order.decode_u16_array(bytes, 0, count)?),
            FieldType::SShort => FieldValue::SShorts(order.decode_i16_array(bytes, 0, count)?),
            FieldType::Long | FieldType::Ifd => {
                FieldValue::Longs(order.decode_u32_array(bytes, 0, count)?)
            }
            FieldType::SLong => FieldValue::SLongs(order.decode_i32_array(bytes, 0, count)?),
            FieldType::Rational => {
                FieldValue::Rationals(order.decode_rational_array(bytes, 0, count, true)?)
            }
            FieldType::SRational => {
                FieldValue::Rationals(order.decode_rational_array(bytes, 0, count, false)?)
            }
            FieldType::Float => FieldValue::Floats(order.decode_f32_array(bytes, 0, count)?),
            FieldType::Double => FieldValue::Doubles(order.decode_f64_array(bytes, 0, count)?),
            FieldType::Unknown(_) => FieldValue::Undefined(bytes.to_vec()),
        };
        Ok(value)
    }

    /// Encodes a value as the raw bytes of this type
    pub fn encode(&self, value: &FieldValue, order: ByteOrder) -> Result<Vec<u8>> {
        let bytes = match (self, value) {
            (FieldType::Byte | FieldType::Undefined | FieldType::Unknown(_), FieldValue::Bytes(v))
            | (FieldType::Byte | FieldType::Undefined | FieldType::Unknown(_), FieldValue::Undefined(v)) => v.clone(),
            (FieldType::SByte, FieldValue::SBytes(v)) => v.iter().map(|&b| b as u8).collect(),
            (FieldType::Ascii, FieldValue::Ascii(strings)) => {
                let mut out = Vec::new();
                for s in strings {
                    out.extend_from_slice(s.as_bytes());
                    out.push(0);
                }
                out
            }
            (FieldType::Ascii, FieldValue::Text(s)) => {
                let mut out = s.as_bytes().to_vec();
                out.push(0);
                out
            }
            (FieldType::Ascii, FieldValue::Date(date)) => {
                let mut out = date.format(DATE_TIME_FORMAT).to_string().into_bytes();
                out.push(0);
                out
            }
            (FieldType::Short, FieldValue::Shorts(v)) => order.encode_u16_array(v),
            (FieldType::SShort, FieldValue::SShorts(v)) => order.encode_i16_array(v),
            (FieldType::Long | FieldType::Ifd, FieldValue::Longs(v)) => order.encode_u32_array(v),
            (FieldType::SLong, FieldValue::SLongs(v)) => order.encode_i32_array(v),
            (FieldType::Rational | FieldType::SRational, FieldValue::Rationals(v)) => {
                order.encode_rational_array(v)
            }
            (FieldType::Float, FieldValue::Floats(v)) => order.encode_f32_array(v),
            (FieldType::Double, FieldValue::Doubles(v)) => order.encode_f64_array(v),
            _ => {
                return Err(Error::InvalidFormat(format!(
                    "Cannot encode {} value as {}",
                    value.kind_name(),
                    self.name()
                )))
            }
        };
        Ok(bytes)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Unknown(code) => write!(f, "Unknown ({})", code),
            other => f.write_str(other.name()),
        }
    }
}

/// Layout of EXIF date/time strings
pub const DATE_TIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

fn raw(bytes: &[u8], count: usize) -> Result<&[u8]> {
    crate::io::bytes::head(bytes, count)
}

/// Splits NUL separated ASCII into strings
///
/// A trailing unterminated run counts as a final string.
fn decode_ascii(bytes: &[u8]) -> Vec<String> {
    let mut strings = Vec::new();
    let mut start = 0;
    while start < bytes.len() {
        let end = crate::io::bytes::find_null(bytes, start).unwrap_or(bytes.len());
        strings.push(String::from_utf8_lossy(&bytes[start..end]).into_owned());
        start = end + 1;
    }
    strings
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    Bytes(Vec<u8>),
    SBytes(Vec<i8>),
    Ascii(Vec<String>),
    Shorts(Vec<u16>),
    SShorts(Vec<i16>),
    Longs(Vec<u32>),
    SLongs(Vec<i32>),
    Rationals(Vec<RationalNumber>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
    Undefined(Vec<u8>),
    Date(NaiveDateTime),
    Text(String),
}

impl FieldValue {
    fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Bytes(_) => "bytes",
            FieldValue::SBytes(_) => "signed bytes",
            FieldValue::Ascii(_) => "ASCII",
            FieldValue::Shorts(_) => "shorts",
            FieldValue::SShorts(_) => "signed shorts",
            FieldValue::Longs(_) => "longs",
            FieldValue::SLongs(_) => "signed longs",
            FieldValue::Rationals(_) => "rationals",
            FieldValue::Floats(_) => "floats",
            FieldValue::Doubles(_) => "doubles",
            FieldValue::Undefined(_) => "undefined",
            FieldValue::Date(_) => "date",
            FieldValue::Text(_) => "text",
        }
    }

    /// All numeric elements widened to `f64`
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        let numbers = match self {
            FieldValue::Bytes(v) | FieldValue::Undefined(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::SBytes(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::Shorts(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::SShorts(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::Longs(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::SLongs(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::Rationals(v) => v.iter().map(|r| r.value()).collect(),
            FieldValue::Floats(v) => v.iter().map(|&x| x as f64).collect(),
            FieldValue::Doubles(v) => v.clone(),
            FieldValue::Ascii(_) | FieldValue::Date(_) | FieldValue::Text(_) => return None,
        };
        Some(numbers)
    }

    /// The single numeric value, if there is exactly one
    pub fn as_number(&self) -> Option<f64> {
        match self.as_numbers()?.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Unsigned integer elements (bytes, shorts, longs)
    pub fn as_u32s(&self) -> Option<Vec<u32>> {
        match self {
            FieldValue::Bytes(v) => Some(v.iter().map(|&x| x as u32).collect()),
            FieldValue::Shorts(v) => Some(v.iter().map(|&x| x as u32).collect()),
            FieldValue::Longs(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// First unsigned integer element
    pub fn as_u32(&self) -> Option<u32> {
        self.as_u32s()?.first().copied()
    }

    /// Text content; multiple ASCII strings are joined with ", "
    pub fn as_string(&self) -> Option<String> {
        match self {
            FieldValue::Ascii(strings) => Some(strings.join(", ")),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Date(d) => Some(d.format(DATE_TIME_FORMAT).to_string()),
            _ => None,
        }
    }

    pub fn as_rationals(&self) -> Option<&[RationalNumber]> {
        match self {
            FieldValue::Rationals(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(v) | FieldValue::Undefined(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            const SHOWN: usize = 16;
            for (i, item) in items.iter().take(SHOWN).enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item)?;
            }
            if items.len() > SHOWN {
                write!(f, ", ... ({} values)", items.len())?;
            }
            Ok(())
        }

        match self {
            FieldValue::Bytes(v) | FieldValue::Undefined(v) => list(f, v),
            FieldValue::SBytes(v) => list(f, v),
            FieldValue::Ascii(v) => {
                let quoted: Vec<String> = v.iter().map(|s| format!("'{}'", s)).collect();
                list(f, &quoted)
            }
            FieldValue::Shorts(v) => list(f, v),
            FieldValue::SShorts(v) => list(f, v),
            FieldValue::Longs(v) => list(f, v),
            FieldValue::SLongs(v) => list(f, v),
            FieldValue::Rationals(v) => list(f, v),
            FieldValue::Floats(v) => list(f, v),
            FieldValue::Doubles(v) => list(f, v),
            FieldValue::Date(d) => write!(f, "{}", d.format(DATE_TIME_FORMAT)),
            FieldValue::Text(s) => write!(f, "'{}'", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 1..=13 {
            assert_eq!(FieldType::from_code(code).code(), code);
        }
        assert_eq!(FieldType::from_code(99), FieldType::Unknown(99));
        assert_eq!(FieldType::from_code(0).code(), 0);
    }

    #[test]
    fn test_unit_sizes() {
        let sizes: Vec<usize> = ANY.iter().map(|t| t.unit_size()).collect();
        assert_eq!(sizes, vec![1, 1, 2, 4, 8, 1, 1, 2, 4, 8, 4, 8, 4]);
        assert_eq!(FieldType::Unknown(42).unit_size(), 1);
    }

    #[test]
    fn test_fits_inline() {
        assert!(FieldType::Short.fits_inline(2));
        assert!(!FieldType::Short.fits_inline(3));
        assert!(FieldType::Ascii.fits_inline(4));
        assert!(!FieldType::Rational.fits_inline(1));
        assert!(FieldType::Long.fits_inline(0));
    }

    #[test]
    fn test_decode_numbers() {
        let order = ByteOrder::LittleEndian;
        let value = FieldType::Short.decode(&[1, 0, 2, 0], 2, order).unwrap();
        assert_eq!(value, FieldValue::Shorts(vec![1, 2]));
        assert_eq!(value.as_u32s(), Some(vec![1, 2]));
        assert_eq!(value.as_number(), None);

        let value = FieldType::SLong.decode(&order.encode_i32(-5), 1, order).unwrap();
        assert_eq!(value.as_number(), Some(-5.0));
    }

    #[test]
    fn test_decode_rationals() {
        let order = ByteOrder::BigEndian;
        let bytes = order.encode_rational(RationalNumber::new(72, 1));
        let value = FieldType::Rational.decode(&bytes, 1, order).unwrap();
        assert_eq!(value.as_rationals(), Some(&[RationalNumber::new(72, 1)][..]));
    }

    #[test]
    fn test_decode_ascii() {
        let value = FieldType::Ascii.decode(b"Canon\0", 6, ByteOrder::BigEndian).unwrap();
        assert_eq!(value, FieldValue::Ascii(vec!["Canon".to_string()]));

        let value = FieldType::Ascii.decode(b"a\0bc\0d", 6, ByteOrder::BigEndian).unwrap();
        assert_eq!(value.as_string().unwrap(), "a, bc, d");
    }

    #[test]
    fn test_decode_short_input() {
        assert!(FieldType::Long.decode(&[0, 0], 1, ByteOrder::BigEndian).is_err());
        assert!(FieldType::Byte.decode(&[0], 2, ByteOrder::BigEndian).is_err());
    }

    #[test]
    fn test_unknown_type_keeps_raw_bytes() {
        let value = FieldType::Unknown(99).decode(&[1, 2, 3, 4], 4, ByteOrder::BigEndian).unwrap();
        assert_eq!(value.as_bytes(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_encode_matches_decode() {
        let order = ByteOrder::LittleEndian;
        let value = FieldValue::Longs(vec![7, 8]);
        let bytes = FieldType::Long.encode(&value, order).unwrap();
        assert_eq!(FieldType::Long.decode(&bytes, 2, order).unwrap(), value);

        let bytes = FieldType::Ascii.encode(&FieldValue::Text("x".into()), order).unwrap();
        assert_eq!(bytes, b"x\0");

        assert!(FieldType::Short.encode(&value, order).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldValue::Shorts(vec![1, 2]).to_string(), "1, 2");
        assert_eq!(FieldValue::Ascii(vec!["a".into()]).to_string(), "'a'");
        assert_eq!(FieldType::Unknown(20).to_string(), "Unknown (20)");
    }
}
