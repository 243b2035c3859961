//! Image File Directory (IFD) structures

use std::fmt;
use std::sync::OnceLock;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::field_type::{FieldType, FieldValue, INLINE_VALUE_SIZE};
use super::tags::{self, TagInfo};
use crate::error::{Error, Result};
use crate::io::ByteOrder;

/// Size of one directory entry in bytes
pub const ENTRY_SIZE: u64 = 12;

/// Role of a directory in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DirectoryKind {
    /// Directory `n` of the next-pointer chain
    Image(u32),
    Exif,
    Gps,
    Interoperability,
    MakerNotes,
    Unknown,
}

impl DirectoryKind {
    /// IFD0, the main image
    pub const ROOT: DirectoryKind = DirectoryKind::Image(0);
    /// IFD1, usually a reduced resolution image
    pub const SUB: DirectoryKind = DirectoryKind::Image(1);
    /// IFD2
    pub const THUMBNAIL: DirectoryKind = DirectoryKind::Image(2);

    pub fn is_image(&self) -> bool {
        matches!(self, DirectoryKind::Image(_))
    }

    /// Kind of the directory the next pointer of this one leads to
    pub fn next(&self) -> DirectoryKind {
        match self {
            DirectoryKind::Image(n) => DirectoryKind::Image(n.saturating_add(1)),
            _ => DirectoryKind::Unknown,
        }
    }

    pub fn description(&self) -> String {
        match self {
            DirectoryKind::Image(0) => "Root".to_string(),
            DirectoryKind::Image(1) => "Sub".to_string(),
            DirectoryKind::Image(2) => "Thumbnail".to_string(),
            DirectoryKind::Image(n) => format!("Image {}", n),
            DirectoryKind::Exif => "Exif".to_string(),
            DirectoryKind::Gps => "Gps".to_string(),
            DirectoryKind::Interoperability => "Interoperability".to_string(),
            DirectoryKind::MakerNotes => "Maker Notes".to_string(),
            DirectoryKind::Unknown => "Unknown".to_string(),
        }
    }
}

impl fmt::Display for DirectoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// One entry of a directory with its value bytes
#[derive(Debug, Clone)]
pub struct TiffField {
    /// TIFF tag identifier
    pub tag: u16,
    /// Kind of the directory holding this field
    pub directory: DirectoryKind,
    /// Type code as stored in the entry
    pub type_code: u16,
    pub field_type: FieldType,
    /// Number of values
    pub count: u32,
    /// The 4 value/offset bytes of the entry
    pub offset_bytes: [u8; 4],
    /// Value bytes, inline or fetched from the declared offset
    pub value_bytes: Vec<u8>,
    pub byte_order: ByteOrder,
    /// Position of the entry in its directory
    pub sort_hint: usize,
    tag_info: OnceLock<&'static TagInfo>,
}

impl TiffField {
    /// Creates a field from an entry's raw parts
    pub fn new(
        tag: u16,
        directory: DirectoryKind,
        type_code: u16,
        count: u32,
        offset_bytes: [u8; 4],
        value_bytes: Vec<u8>,
        byte_order: ByteOrder,
    ) -> Self {
        Self {
            tag,
            directory,
            type_code,
            field_type: FieldType::from_code(type_code),
            count,
            offset_bytes,
            value_bytes,
            byte_order,
            sort_hint: 0,
            tag_info: OnceLock::new(),
        }
    }

    /// Creates a field whose value fits the entry's inline bytes
    pub fn inline(
        tag: u16,
        directory: DirectoryKind,
        field_type: FieldType,
        count: u32,
        value_bytes: &[u8],
        byte_order: ByteOrder,
    ) -> Result<Self> {
        if value_bytes.len() > INLINE_VALUE_SIZE {
            return Err(Error::InvalidFormat(format!(
                "Inline value of tag 0x{:04x} holds {} bytes",
                tag,
                value_bytes.len()
            )));
        }
        let mut offset_bytes = [0u8; 4];
        offset_bytes[..value_bytes.len()].copy_from_slice(value_bytes);
        Ok(Self::new(
            tag,
            directory,
            field_type.code(),
            count,
            offset_bytes,
            value_bytes.to_vec(),
            byte_order,
        ))
    }

    pub fn with_sort_hint(mut self, sort_hint: usize) -> Self {
        self.sort_hint = sort_hint;
        self
    }

    /// Definition of this tag, resolved once for the holding directory
    pub fn tag_info(&self) -> &'static TagInfo {
        self.tag_info.get_or_init(|| tags::resolve(self.directory, self.tag))
    }

    pub fn tag_name(&self) -> String {
        let info = self.tag_info();
        if info.is_unknown() {
            format!("Unknown Tag (0x{:04x})", self.tag)
        } else {
            info.name.to_string()
        }
    }

    /// Offset stored in the entry; only meaningful for oversized values
    pub fn offset(&self) -> u32 {
        match self.byte_order {
            ByteOrder::LittleEndian => u32::from_le_bytes(self.offset_bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(self.offset_bytes),
        }
    }

    /// Whether the value lives outside the entry
    ///
    /// Unknown types never are: only their 4 inline bytes are kept.
    pub fn is_oversized(&self) -> bool {
        !matches!(self.field_type, FieldType::Unknown(_)) && !self.field_type.fits_inline(self.count)
    }

    /// Decodes the value as declared by the tag definition
    pub fn value(&self) -> Result<FieldValue> {
        self.tag_info()
            .decode(self.field_type, &self.value_bytes, self.count as usize, self.byte_order)
    }

    /// Unsigned integer values; other value types are a format error
    pub fn int_values(&self) -> Result<Vec<u32>> {
        self.value()?.as_u32s().ok_or_else(|| {
            Error::InvalidFormat(format!(
                "{} is not an integer field ({})",
                self.tag_name(),
                self.field_type
            ))
        })
    }

    /// First unsigned integer value
    pub fn int_value(&self) -> Result<u32> {
        self.int_values()?.first().copied().ok_or_else(|| {
            Error::InvalidFormat(format!("{} holds no values", self.tag_name()))
        })
    }
}

impl PartialEq for TiffField {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.directory == other.directory
            && self.type_code == other.type_code
            && self.count == other.count
            && self.offset_bytes == other.offset_bytes
            && self.value_bytes == other.value_bytes
            && self.byte_order == other.byte_order
    }
}

impl Serialize for TiffField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TiffField", 6)?;
        state.serialize_field("tag", &self.tag)?;
        state.serialize_field("name", &self.tag_name())?;
        state.serialize_field("type", self.field_type.name())?;
        state.serialize_field("count", &self.count)?;
        let offset = self.is_oversized().then(|| self.offset());
        state.serialize_field("offset", &offset)?;
        state.serialize_field("value", &self.value().ok())?;
        state.end()
    }
}

impl fmt::Display for TiffField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04x}, {}): ", self.tag_name(), self.tag, self.field_type.name())?;
        match self.value() {
            Ok(value) => write!(f, "{}", value),
            Err(e) => write!(f, "<{}>", e),
        }
    }
}

/// A raw byte range of the container with its (possibly fetched) content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataElement {
    pub offset: u64,
    pub length: u64,
    #[serde(skip)]
    pub data: Vec<u8>,
}

impl DataElement {
    pub fn new(offset: u64, length: u64, data: Vec<u8>) -> Self {
        Self { offset, length, data }
    }
}

/// Compressed image payload of a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImageData {
    Strips(Vec<DataElement>),
    Tiles(Vec<DataElement>),
}

impl ImageData {
    pub fn blocks(&self) -> &[DataElement] {
        match self {
            ImageData::Strips(blocks) | ImageData::Tiles(blocks) => blocks,
        }
    }

    pub fn is_tiled(&self) -> bool {
        matches!(self, ImageData::Tiles(_))
    }
}

/// Represents an Image File Directory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiffDirectory {
    pub kind: DirectoryKind,
    /// Offset of this directory in the source
    pub offset: u64,
    /// Offset of the next directory, 0 for none
    pub next_offset: u64,
    #[serde(skip)]
    pub byte_order: ByteOrder,
    /// Fields in entry order
    pub fields: Vec<TiffField>,
    /// Entries present in the source, dropped ones included
    #[serde(skip)]
    pub raw_entry_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_data: Option<ImageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jpeg_data: Option<DataElement>,
}

impl TiffDirectory {
    pub fn new(kind: DirectoryKind, offset: u64, byte_order: ByteOrder) -> Self {
        Self {
            kind,
            offset,
            next_offset: 0,
            byte_order,
            fields: Vec::new(),
            raw_entry_count: 0,
            image_data: None,
            jpeg_data: None,
        }
    }

    pub fn add_field(&mut self, field: TiffField) {
        self.fields.push(field);
    }

    pub fn find_field(&self, tag: u16) -> Option<&TiffField> {
        self.fields.iter().find(|f| f.tag == tag)
    }

    pub fn has_field(&self, tag: u16) -> bool {
        self.find_field(tag).is_some()
    }

    /// Removes the first field with `tag`
    pub fn remove_field(&mut self, tag: u16) -> Option<TiffField> {
        let index = self.fields.iter().position(|f| f.tag == tag)?;
        Some(self.fields.remove(index))
    }

    /// Decoded value of `tag`, `None` when absent
    pub fn field_value(&self, tag: u16) -> Result<Option<FieldValue>> {
        self.find_field(tag).map(TiffField::value).transpose()
    }

    /// Integer values of `tag`; a missing tag is an error
    pub fn required_ints(&self, tag: u16) -> Result<Vec<u32>> {
        self.find_field(tag).ok_or(Error::MissingTag(tag))?.int_values()
    }

    /// First integer value of `tag`; a missing tag is an error
    pub fn required_int(&self, tag: u16) -> Result<u32> {
        self.find_field(tag).ok_or(Error::MissingTag(tag))?.int_value()
    }

    /// First integer value of `tag` or `default` when absent
    pub fn int_or(&self, tag: u16, default: u32) -> Result<u32> {
        match self.find_field(tag) {
            Some(field) => field.int_value(),
            None => Ok(default),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.fields.len()
    }

    /// Byte length of the directory structure: count, entries and next offset
    pub fn length(&self) -> u64 {
        let entries = self.raw_entry_count.max(self.fields.len()) as u64;
        2 + ENTRY_SIZE * entries + 4
    }

    pub fn is_tiled(&self) -> bool {
        self.has_field(tags::TILE_OFFSETS)
    }

    pub fn description(&self) -> String {
        self.kind.description()
    }
}

impl fmt::Display for TiffDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} directory at {} ({} fields):", self.description(), self.offset, self.fields.len())?;
        for field in &self.fields {
            writeln!(f, "  {}", field)?;
        }
        if let Some(image_data) = &self.image_data {
            let label = if image_data.is_tiled() { "tiles" } else { "strips" };
            writeln!(f, "  Image data: {} {}", image_data.blocks().len(), label)?;
        }
        if let Some(jpeg) = &self.jpeg_data {
            writeln!(f, "  JPEG thumbnail: {} bytes at {}", jpeg.length, jpeg.offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_field(tag: u16, value: u16) -> TiffField {
        let order = ByteOrder::LittleEndian;
        TiffField::inline(tag, DirectoryKind::ROOT, FieldType::Short, 1, &order.encode_u16(value), order)
            .unwrap()
    }

    #[test]
    fn test_directory_kind() {
        assert_eq!(DirectoryKind::ROOT.description(), "Root");
        assert_eq!(DirectoryKind::SUB.to_string(), "Sub");
        assert_eq!(DirectoryKind::THUMBNAIL.description(), "Thumbnail");
        assert_eq!(DirectoryKind::Image(5).description(), "Image 5");
        assert_eq!(DirectoryKind::MakerNotes.description(), "Maker Notes");
        assert_eq!(DirectoryKind::ROOT.next(), DirectoryKind::SUB);
        assert!(DirectoryKind::Image(9).is_image());
        assert!(!DirectoryKind::Gps.is_image());
    }

    #[test]
    fn test_field_creation() {
        let field = short_field(tags::IMAGE_WIDTH, 1024);
        assert_eq!(field.tag, tags::IMAGE_WIDTH);
        assert_eq!(field.field_type, FieldType::Short);
        assert_eq!(field.tag_name(), "ImageWidth");
        assert_eq!(field.int_value().unwrap(), 1024);
        assert!(!field.is_oversized());
    }

    #[test]
    fn test_oversized_field() {
        let order = ByteOrder::BigEndian;
        let field = TiffField::new(
            tags::X_RESOLUTION,
            DirectoryKind::ROOT,
            FieldType::Rational.code(),
            1,
            order.encode_u32(120),
            order.encode_rational_array(&[crate::types::RationalNumber::new(72, 1)]),
            order,
        );
        assert!(field.is_oversized());
        assert_eq!(field.offset(), 120);
        let value = field.value().unwrap();
        assert_eq!(value.as_number(), Some(72.0));
        assert!(field.int_values().is_err());
    }

    #[test]
    fn test_unknown_tag_name() {
        let field = short_field(0x7777, 1);
        assert_eq!(field.tag_name(), "Unknown Tag (0x7777)");
    }

    #[test]
    fn test_inline_rejects_long_values() {
        let result = TiffField::inline(
            tags::MAKE,
            DirectoryKind::ROOT,
            FieldType::Ascii,
            6,
            b"Canon\0",
            ByteOrder::LittleEndian,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_directory_lookup() {
        let mut dir = TiffDirectory::new(DirectoryKind::ROOT, 8, ByteOrder::LittleEndian);
        dir.add_field(short_field(tags::IMAGE_WIDTH, 640));
        dir.add_field(short_field(tags::IMAGE_LENGTH, 480));

        assert_eq!(dir.entry_count(), 2);
        assert_eq!(dir.length(), 2 + 24 + 4);
        assert_eq!(dir.required_int(tags::IMAGE_LENGTH).unwrap(), 480);
        assert_eq!(dir.int_or(tags::SAMPLES_PER_PIXEL, 1).unwrap(), 1);
        assert!(matches!(dir.required_int(tags::COMPRESSION), Err(Error::MissingTag(tags::COMPRESSION))));
        assert!(dir.field_value(tags::COMPRESSION).unwrap().is_none());
        assert!(!dir.is_tiled());
    }

    #[test]
    fn test_remove_field() {
        let mut dir = TiffDirectory::new(DirectoryKind::Exif, 100, ByteOrder::BigEndian);
        dir.add_field(short_field(tags::GPS_INFO, 1));
        dir.add_field(short_field(tags::IMAGE_WIDTH, 2));

        let removed = dir.remove_field(tags::GPS_INFO).unwrap();
        assert_eq!(removed.tag, tags::GPS_INFO);
        assert!(dir.remove_field(tags::GPS_INFO).is_none());
        assert_eq!(dir.entry_count(), 1);
    }

    #[test]
    fn test_image_data_blocks() {
        let data = ImageData::Tiles(vec![DataElement::new(10, 4, vec![0; 4])]);
        assert!(data.is_tiled());
        assert_eq!(data.blocks().len(), 1);
        assert_eq!(data.blocks()[0].length, 4);
    }
}
