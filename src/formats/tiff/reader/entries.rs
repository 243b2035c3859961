//! Directory entry parsing and value fetching

use crate::compliance::FormatCompliance;
use crate::error::{Error, Result};
use crate::formats::tiff::field_type::{FieldType, INLINE_VALUE_SIZE};
use crate::formats::tiff::ifd::{TiffField, ENTRY_SIZE};
use crate::formats::tiff::tags;
use crate::io::{ByteOrder, ByteSource};

/// Defined values of enumerated baseline tags
const ENUMERATED: &[(u16, &[i64])] = &[
    (tags::COMPRESSION, &[1, 2, 3, 4, 5, 6, 7, 8, 32773, 32946, 34712, 34892]),
    (tags::PLANAR_CONFIGURATION, &[1, 2]),
    (tags::RESOLUTION_UNIT, &[1, 2, 3]),
    (tags::PREDICTOR, &[1, 2, 3]),
];

/// One 12-byte directory entry as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEntry {
    pub tag: u16,
    pub type_code: u16,
    pub count: u32,
    pub offset_bytes: [u8; 4],
    /// Position within the directory
    pub index: usize,
}

impl RawEntry {
    /// Parses the entry starting at `start`
    pub fn parse(bytes: &[u8], start: usize, order: ByteOrder, index: usize) -> Result<Self> {
        let tag = order.decode_u16(bytes, start)?;
        let type_code = order.decode_u16(bytes, start + 2)?;
        let count = order.decode_u32(bytes, start + 4)?;
        let mut offset_bytes = [0u8; 4];
        offset_bytes.copy_from_slice(crate::io::bytes::slice(bytes, start + 8, INLINE_VALUE_SIZE)?);
        Ok(Self {
            tag,
            type_code,
            count,
            offset_bytes,
            index,
        })
    }

    pub fn field_type(&self) -> FieldType {
        FieldType::from_code(self.type_code)
    }

    pub fn offset(&self, order: ByteOrder) -> u32 {
        match order {
            ByteOrder::LittleEndian => u32::from_le_bytes(self.offset_bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(self.offset_bytes),
        }
    }
}

/// Parses consecutive entries; a trailing partial entry is ignored
pub fn parse_entries(bytes: &[u8], order: ByteOrder) -> Result<Vec<RawEntry>> {
    let entry_size = ENTRY_SIZE as usize;
    (0..bytes.len() / entry_size)
        .map(|index| RawEntry::parse(bytes, index * entry_size, order, index))
        .collect()
}

/// Reads entry values, inline or from their declared offset
pub struct ValueReader<'a> {
    source: &'a dyn ByteSource,
    order: ByteOrder,
}

impl<'a> ValueReader<'a> {
    pub fn new(source: &'a dyn ByteSource, order: ByteOrder) -> Self {
        Self { source, order }
    }

    /// Value bytes of `entry`
    ///
    /// Unknown types keep their 4 inline bytes. Values larger than 4 bytes
    /// are fetched from the source; a range leaving the source is an error.
    pub fn read_value(&self, entry: &RawEntry) -> Result<Vec<u8>> {
        let field_type = entry.field_type();
        if let FieldType::Unknown(code) = field_type {
            tracing::debug!("Tag 0x{:04x} has unknown type {}, keeping inline bytes", entry.tag, code);
            return Ok(entry.offset_bytes.to_vec());
        }

        let length = field_type.byte_length(entry.count).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Tag 0x{:04x}: {} values of {} overflow",
                entry.tag,
                entry.count,
                field_type.name()
            ))
        })?;

        if length <= INLINE_VALUE_SIZE {
            return Ok(entry.offset_bytes[..length].to_vec());
        }

        let offset = entry.offset(self.order) as u64;
        self.source.block(offset, length)
    }
}

/// Records where a field departs from its tag definition
///
/// The stored type must be one the definition accepts and a fixed count must
/// match. Enumerated baseline tags of image directories are also checked
/// against their defined values. Unregistered tags are not checked.
pub fn check_field(field: &TiffField, compliance: &mut FormatCompliance) -> Result<()> {
    let info = field.tag_info();
    if info.is_unknown() {
        return Ok(());
    }

    let valid_types: Vec<i64> = info.types.iter().map(|t| t.code() as i64).collect();
    let type_ok = compliance.compare(
        &format!("{} ({}): field type", info.name, field.directory),
        &valid_types,
        field.type_code as i64,
    )?;
    if let Some(count) = info.count {
        compliance.compare(
            &format!("{} ({}): count", info.name, field.directory),
            &[count as i64],
            field.count as i64,
        )?;
    }
    if !type_ok || !field.directory.is_image() {
        return Ok(());
    }

    let Ok(value) = field.int_value() else {
        return Ok(());
    };
    if let Some((_, valid)) = ENUMERATED.iter().find(|(tag, _)| *tag == field.tag) {
        compliance.compare(info.name, valid, value as i64)?;
    } else if field.tag == tags::ORIENTATION {
        compliance.check_bounds(info.name, 1, 8, value as i64)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::formats::tiff::ifd::DirectoryKind;
    use crate::io::ByteSourceArray;

    fn entry_bytes(order: ByteOrder, tag: u16, type_code: u16, count: u32, value: [u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&order.encode_u16(tag));
        bytes.extend_from_slice(&order.encode_u16(type_code));
        bytes.extend_from_slice(&order.encode_u32(count));
        bytes.extend_from_slice(&value);
        bytes
    }

    #[test]
    fn test_parse_entry() {
        let order = ByteOrder::BigEndian;
        let bytes = entry_bytes(order, 0x0100, 3, 1, [0x04, 0x00, 0, 0]);
        let entry = RawEntry::parse(&bytes, 0, order, 3).unwrap();
        assert_eq!(entry.tag, 0x0100);
        assert_eq!(entry.field_type(), FieldType::Short);
        assert_eq!(entry.count, 1);
        assert_eq!(entry.index, 3);
        assert_eq!(entry.offset(order), 0x0400_0000);
    }

    #[test]
    fn test_parse_entries_ignores_partial_tail() {
        let order = ByteOrder::LittleEndian;
        let mut bytes = entry_bytes(order, 1, 3, 1, [0; 4]);
        bytes.extend(entry_bytes(order, 2, 4, 1, [0; 4]));
        bytes.extend_from_slice(&[0xFF; 5]);
        let entries = parse_entries(&bytes, order).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].tag, 2);
    }

    #[test]
    fn test_read_inline_value() {
        let order = ByteOrder::LittleEndian;
        let source = ByteSourceArray::new(vec![]);
        let bytes = entry_bytes(order, 0x0102, 3, 2, [8, 0, 16, 0]);
        let entry = RawEntry::parse(&bytes, 0, order, 0).unwrap();
        let value = ValueReader::new(&source, order).read_value(&entry).unwrap();
        assert_eq!(value, vec![8, 0, 16, 0]);
    }

    #[test]
    fn test_read_oversized_value() {
        let order = ByteOrder::LittleEndian;
        let mut data = vec![0u8; 16];
        data[10..16].copy_from_slice(b"Canon\0");
        let source = ByteSourceArray::new(data);

        let bytes = entry_bytes(order, 0x010F, 2, 6, order.encode_u32(10));
        let entry = RawEntry::parse(&bytes, 0, order, 0).unwrap();
        let value = ValueReader::new(&source, order).read_value(&entry).unwrap();
        assert_eq!(value, b"Canon\0".to_vec());
    }

    #[test]
    fn test_value_outside_source() {
        let order = ByteOrder::BigEndian;
        let source = ByteSourceArray::new(vec![0u8; 16]);
        let bytes = entry_bytes(order, 0x010F, 2, 6, order.encode_u32(12));
        let entry = RawEntry::parse(&bytes, 0, order, 0).unwrap();
        let err = ValueReader::new(&source, order).read_value(&entry).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_unknown_type_keeps_inline_bytes() {
        let order = ByteOrder::BigEndian;
        let source = ByteSourceArray::new(vec![]);
        let bytes = entry_bytes(order, 0x1234, 99, 1000, [1, 2, 3, 4]);
        let entry = RawEntry::parse(&bytes, 0, order, 0).unwrap();
        let value = ValueReader::new(&source, order).read_value(&entry).unwrap();
        assert_eq!(value, vec![1, 2, 3, 4]);
    }

    fn short_field(kind: DirectoryKind, tag: u16, value: u16) -> TiffField {
        let order = ByteOrder::LittleEndian;
        TiffField::inline(tag, kind, FieldType::Short, 1, &order.encode_u16(value), order).unwrap()
    }

    #[test]
    fn test_check_field_accepts_conforming_values() {
        let mut compliance = FormatCompliance::new("check", true);
        check_field(&short_field(DirectoryKind::ROOT, tags::IMAGE_WIDTH, 640), &mut compliance).unwrap();
        check_field(&short_field(DirectoryKind::ROOT, tags::COMPRESSION, 5), &mut compliance).unwrap();
        check_field(&short_field(DirectoryKind::SUB, tags::ORIENTATION, 8), &mut compliance).unwrap();
        check_field(&short_field(DirectoryKind::ROOT, 0x9999, 7), &mut compliance).unwrap();
        assert!(compliance.is_empty());
    }

    #[test]
    fn test_check_field_type_and_count() {
        let order = ByteOrder::LittleEndian;
        let mut compliance = FormatCompliance::lenient();
        let width =
            TiffField::inline(tags::IMAGE_WIDTH, DirectoryKind::ROOT, FieldType::Ascii, 3, b"64\0", order).unwrap();
        check_field(&width, &mut compliance).unwrap();
        let values = [1, 0, 2, 0];
        let length = TiffField::new(tags::IMAGE_LENGTH, DirectoryKind::ROOT, 3, 2, values, values.to_vec(), order);
        check_field(&length, &mut compliance).unwrap();

        assert_eq!(compliance.comments().len(), 2);
        assert_eq!(
            compliance.comments()[0],
            "ImageWidth (Root): field type: Unexpected value: (valid: {3 (0x3), 4 (0x4)}, actual: 2 (0x2))"
        );
        assert!(compliance.comments()[1].starts_with("ImageLength (Root): count"));
    }

    #[test]
    fn test_check_field_enumerated_values() {
        let mut compliance = FormatCompliance::lenient();
        check_field(&short_field(DirectoryKind::ROOT, tags::PLANAR_CONFIGURATION, 3), &mut compliance).unwrap();
        check_field(&short_field(DirectoryKind::ROOT, tags::RESOLUTION_UNIT, 9), &mut compliance).unwrap();
        check_field(&short_field(DirectoryKind::ROOT, tags::ORIENTATION, 0), &mut compliance).unwrap();
        assert_eq!(compliance.comments().len(), 3);
        assert_eq!(compliance.comments()[2], "Orientation: bounds check: 1 <= 0 <= 8: false");

        let mut strict = FormatCompliance::new("check", true);
        let err = check_field(&short_field(DirectoryKind::ROOT, tags::COMPRESSION, 7000), &mut strict).unwrap_err();
        assert!(matches!(err, Error::Compliance(_)));
    }
}
