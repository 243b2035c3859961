//! TIFF, EXIF, GPS and Interoperability tag definitions
//!
//! The same numeric id is reused by unrelated directories (GPS `0x0001` is
//! `GPSLatitudeRef`, Interoperability `0x0001` is `InteroperabilityIndex`), so
//! a tag id alone does not name a field. [`TagRegistry::resolve`] picks a
//! definition from the id and the kind of directory holding the field.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::field_type::{self as types, FieldType, FieldValue, DATE_TIME_FORMAT};
use super::ifd::DirectoryKind;
use crate::error::{Error, Result};
use crate::io::{bytes, ByteOrder};

/// New subfile type
pub const NEW_SUBFILE_TYPE: u16 = 0x00FE;

/// Image width in pixels
pub const IMAGE_WIDTH: u16 = 0x0100;

/// Image height in pixels
pub const IMAGE_LENGTH: u16 = 0x0101;

/// Bits per sample
pub const BITS_PER_SAMPLE: u16 = 0x0102;

/// Compression scheme
pub const COMPRESSION: u16 = 0x0103;

/// Photometric interpretation
pub const PHOTOMETRIC_INTERPRETATION: u16 = 0x0106;

/// Image description
pub const IMAGE_DESCRIPTION: u16 = 0x010E;

/// Camera make
pub const MAKE: u16 = 0x010F;

/// Camera model
pub const MODEL: u16 = 0x0110;

/// Strip offsets
pub const STRIP_OFFSETS: u16 = 0x0111;

/// Orientation
pub const ORIENTATION: u16 = 0x0112;

/// Samples per pixel
pub const SAMPLES_PER_PIXEL: u16 = 0x0115;

/// Rows per strip
pub const ROWS_PER_STRIP: u16 = 0x0116;

/// Strip byte counts
pub const STRIP_BYTE_COUNTS: u16 = 0x0117;

/// X resolution
pub const X_RESOLUTION: u16 = 0x011A;

/// Y resolution
pub const Y_RESOLUTION: u16 = 0x011B;

/// Planar configuration
pub const PLANAR_CONFIGURATION: u16 = 0x011C;

/// Resolution unit
pub const RESOLUTION_UNIT: u16 = 0x0128;

/// Software
pub const SOFTWARE: u16 = 0x0131;

/// Date/time
pub const DATE_TIME: u16 = 0x0132;

/// Predictor
pub const PREDICTOR: u16 = 0x013D;

/// Tile width
pub const TILE_WIDTH: u16 = 0x0142;

/// Tile length
pub const TILE_LENGTH: u16 = 0x0143;

/// Tile offsets
pub const TILE_OFFSETS: u16 = 0x0144;

/// Tile byte counts
pub const TILE_BYTE_COUNTS: u16 = 0x0145;

/// Sample format
pub const SAMPLE_FORMAT: u16 = 0x0153;

/// Offset of an embedded JPEG thumbnail
pub const JPEG_INTERCHANGE_FORMAT: u16 = 0x0201;

/// Length of an embedded JPEG thumbnail
pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 0x0202;

/// Pointer to the EXIF directory
pub const EXIF_OFFSET: u16 = 0x8769;

/// Pointer to the GPS directory
pub const GPS_INFO: u16 = 0x8825;

/// Pointer to the Interoperability directory
pub const INTEROP_OFFSET: u16 = 0xA005;

/// Original capture date/time
pub const DATE_TIME_ORIGINAL: u16 = 0x9003;

/// Maker notes
pub const MAKER_NOTE: u16 = 0x927C;

/// Free-form user comment
pub const USER_COMMENT: u16 = 0x9286;

pub const GPS_VERSION_ID: u16 = 0x0000;
pub const GPS_LATITUDE_REF: u16 = 0x0001;
pub const GPS_LATITUDE: u16 = 0x0002;
pub const GPS_LONGITUDE_REF: u16 = 0x0003;
pub const GPS_LONGITUDE: u16 = 0x0004;
pub const GPS_ALTITUDE_REF: u16 = 0x0005;
pub const GPS_ALTITUDE: u16 = 0x0006;
pub const GPS_PROCESSING_METHOD: u16 = 0x001B;

pub const INTEROPERABILITY_INDEX: u16 = 0x0001;
pub const INTEROPERABILITY_VERSION: u16 = 0x0002;

/// Windows Explorer title
pub const XP_TITLE: u16 = 0x9C9B;

/// Directory a tag definition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TagDirectory {
    Root,
    Ifd1,
    Ifd2,
    Ifd3,
    Exif,
    Gps,
    Interop,
    MakerNotes,
    /// Valid in any directory
    Any,
}

impl TagDirectory {
    /// Image directories as opposed to metadata directories
    pub fn is_image(&self) -> bool {
        matches!(self, TagDirectory::Root | TagDirectory::Ifd1 | TagDirectory::Ifd2 | TagDirectory::Ifd3)
    }

    /// Whether this is the definition's own directory for `kind`
    pub fn matches(&self, kind: DirectoryKind) -> bool {
        matches!(
            (self, kind),
            (TagDirectory::Root, DirectoryKind::Image(0))
                | (TagDirectory::Ifd1, DirectoryKind::Image(1))
                | (TagDirectory::Ifd2, DirectoryKind::Image(2))
                | (TagDirectory::Ifd3, DirectoryKind::Image(3))
                | (TagDirectory::Exif, DirectoryKind::Exif)
                | (TagDirectory::Gps, DirectoryKind::Gps)
                | (TagDirectory::Interop, DirectoryKind::Interoperability)
                | (TagDirectory::MakerNotes, DirectoryKind::MakerNotes)
        )
    }
}

/// How a tag's raw value is turned into a [`FieldValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagFormat {
    /// Decoded by the field type alone
    Plain,
    /// Offset of a sub-directory of the given kind
    Offset(DirectoryKind),
    /// `YYYY:MM:DD HH:MM:SS` ASCII date
    DateTime,
    /// 8-byte character code prefix followed by text
    EncodedText,
    /// Windows Explorer UCS-2 little-endian string stored as bytes
    XpString,
}

/// A tag definition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TagInfo {
    pub name: &'static str,
    pub tag: u16,
    /// Field types the tag is expected to use
    pub types: &'static [FieldType],
    /// Expected element count, `None` for any
    pub count: Option<u32>,
    pub directory: TagDirectory,
    pub format: TagFormat,
}

impl TagInfo {
    pub const fn new(
        name: &'static str,
        tag: u16,
        types: &'static [FieldType],
        directory: TagDirectory,
    ) -> Self {
        Self {
            name,
            tag,
            types,
            count: None,
            directory,
            format: TagFormat::Plain,
        }
    }

    pub const fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub const fn with_format(mut self, format: TagFormat) -> Self {
        self.format = format;
        self
    }

    /// Whether this is the placeholder for unregistered ids
    pub fn is_unknown(&self) -> bool {
        std::ptr::eq(self, &UNKNOWN)
    }

    /// Whether the field points at a sub-directory
    pub fn is_offset(&self) -> bool {
        matches!(self.format, TagFormat::Offset(_))
    }

    /// Decodes raw value bytes according to the tag's format
    pub fn decode(
        &self,
        field_type: FieldType,
        raw: &[u8],
        count: usize,
        order: ByteOrder,
    ) -> Result<FieldValue> {
        match self.format {
            TagFormat::Plain | TagFormat::Offset(_) => field_type.decode(raw, count, order),
            TagFormat::DateTime => {
                let value = field_type.decode(raw, count, order)?;
                Ok(parse_date_time(&value).map(FieldValue::Date).unwrap_or(value))
            }
            TagFormat::EncodedText => decode_encoded_text(self.name, field_type, raw, count, order),
            TagFormat::XpString => decode_xp_string(self.name, field_type, raw, count),
        }
    }
}

/// Placeholder returned for ids no table knows about
pub static UNKNOWN: TagInfo = TagInfo::new("Unknown Tag", 0xFFFF, types::ANY, TagDirectory::Any);

fn parse_date_time(value: &FieldValue) -> Option<NaiveDateTime> {
    let FieldValue::Ascii(strings) = value else {
        return None;
    };
    let text = strings.first()?.trim();
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT).ok()
}

const ASCII_PREFIX: &[u8; 8] = b"ASCII\0\0\0";
const JIS_PREFIX: &[u8; 8] = b"JIS\0\0\0\0\0";
const UNICODE_PREFIX: &[u8; 8] = b"UNICODE\0";
const UNDEFINED_PREFIX: &[u8; 8] = &[0; 8];

fn decode_encoded_text(
    name: &str,
    field_type: FieldType,
    raw: &[u8],
    count: usize,
    order: ByteOrder,
) -> Result<FieldValue> {
    match field_type {
        FieldType::Ascii => return field_type.decode(raw, count, order),
        FieldType::Byte | FieldType::Undefined => {}
        other => {
            return Err(Error::InvalidFormat(format!(
                "{}: text field not encoded as bytes ({})",
                name, other
            )))
        }
    }

    let data = bytes::head(raw, count)?;
    if data.len() < ASCII_PREFIX.len() {
        return Ok(FieldValue::Text(latin1(data)));
    }
    let body = &data[ASCII_PREFIX.len()..];

    let text = if bytes::starts_with(data, ASCII_PREFIX) {
        latin1(body)
    } else if bytes::starts_with(data, UNICODE_PREFIX) {
        utf16(body, order)
    } else if bytes::starts_with(data, JIS_PREFIX) {
        String::from_utf8_lossy(body).into_owned()
    } else if bytes::starts_with(data, UNDEFINED_PREFIX) {
        latin1(body)
    } else {
        latin1(data)
    };
    Ok(FieldValue::Text(text.trim_end_matches(['\0', ' ']).to_string()))
}

fn decode_xp_string(name: &str, field_type: FieldType, raw: &[u8], count: usize) -> Result<FieldValue> {
    if field_type != FieldType::Byte {
        return Err(Error::InvalidFormat(format!(
            "{}: text field not encoded as bytes ({})",
            name, field_type
        )));
    }
    let data = bytes::head(raw, count)?;
    Ok(FieldValue::Text(utf16(data, ByteOrder::LittleEndian)))
}

fn latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

/// Decodes UTF-16 up to the first NUL unit
fn utf16(data: &[u8], order: ByteOrder) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| match order {
            ByteOrder::LittleEndian => u16::from_le_bytes([pair[0], pair[1]]),
            ByteOrder::BigEndian => u16::from_be_bytes([pair[0], pair[1]]),
        })
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

use self::TagDirectory as D;

/// Baseline and extension TIFF tags
pub static TIFF_TAGS: &[TagInfo] = &[
    TagInfo::new("NewSubfileType", NEW_SUBFILE_TYPE, types::LONG, D::Root).with_count(1),
    TagInfo::new("SubfileType", 0x00FF, types::SHORT, D::Root).with_count(1),
    TagInfo::new("ImageWidth", IMAGE_WIDTH, types::SHORT_OR_LONG, D::Root).with_count(1),
    TagInfo::new("ImageLength", IMAGE_LENGTH, types::SHORT_OR_LONG, D::Root).with_count(1),
    TagInfo::new("BitsPerSample", BITS_PER_SAMPLE, types::SHORT, D::Root),
    TagInfo::new("Compression", COMPRESSION, types::SHORT, D::Root).with_count(1),
    TagInfo::new("PhotometricInterpretation", PHOTOMETRIC_INTERPRETATION, types::SHORT, D::Root)
        .with_count(1),
    TagInfo::new("Threshholding", 0x0107, types::SHORT, D::Root).with_count(1),
    TagInfo::new("CellWidth", 0x0108, types::SHORT, D::Root).with_count(1),
    TagInfo::new("CellLength", 0x0109, types::SHORT, D::Root).with_count(1),
    TagInfo::new("FillOrder", 0x010A, types::SHORT, D::Root).with_count(1),
    TagInfo::new("DocumentName", 0x010D, types::ASCII, D::Root),
    TagInfo::new("ImageDescription", IMAGE_DESCRIPTION, types::ASCII, D::Root),
    TagInfo::new("Make", MAKE, types::ASCII, D::Root),
    TagInfo::new("Model", MODEL, types::ASCII, D::Root),
    TagInfo::new("StripOffsets", STRIP_OFFSETS, types::SHORT_OR_LONG, D::Root),
    TagInfo::new("Orientation", ORIENTATION, types::SHORT, D::Root).with_count(1),
    TagInfo::new("SamplesPerPixel", SAMPLES_PER_PIXEL, types::SHORT, D::Root).with_count(1),
    TagInfo::new("RowsPerStrip", ROWS_PER_STRIP, types::SHORT_OR_LONG, D::Root).with_count(1),
    TagInfo::new("StripByteCounts", STRIP_BYTE_COUNTS, types::SHORT_OR_LONG, D::Root),
    TagInfo::new("MinSampleValue", 0x0118, types::SHORT, D::Root),
    TagInfo::new("MaxSampleValue", 0x0119, types::SHORT, D::Root),
    TagInfo::new("XResolution", X_RESOLUTION, types::RATIONAL, D::Root).with_count(1),
    TagInfo::new("YResolution", Y_RESOLUTION, types::RATIONAL, D::Root).with_count(1),
    TagInfo::new("PlanarConfiguration", PLANAR_CONFIGURATION, types::SHORT, D::Root).with_count(1),
    TagInfo::new("PageName", 0x011D, types::ASCII, D::Root),
    TagInfo::new("XPosition", 0x011E, types::RATIONAL, D::Root),
    TagInfo::new("YPosition", 0x011F, types::RATIONAL, D::Root),
    TagInfo::new("FreeOffsets", 0x0120, types::LONG, D::Root),
    TagInfo::new("FreeByteCounts", 0x0121, types::LONG, D::Root),
    TagInfo::new("GrayResponseUnit", 0x0122, types::SHORT, D::Root).with_count(1),
    TagInfo::new("GrayResponseCurve", 0x0123, types::SHORT, D::Root),
    TagInfo::new("T4Options", 0x0124, types::LONG, D::Root).with_count(1),
    TagInfo::new("T6Options", 0x0125, types::LONG, D::Root).with_count(1),
    TagInfo::new("ResolutionUnit", RESOLUTION_UNIT, types::SHORT, D::Root).with_count(1),
    TagInfo::new("PageNumber", 0x0129, types::SHORT, D::Root).with_count(2),
    TagInfo::new("TransferFunction", 0x012D, types::SHORT, D::Root),
    TagInfo::new("Software", SOFTWARE, types::ASCII, D::Root),
    TagInfo::new("DateTime", DATE_TIME, types::ASCII, D::Root)
        .with_count(20)
        .with_format(TagFormat::DateTime),
    TagInfo::new("Artist", 0x013B, types::ASCII, D::Root),
    TagInfo::new("HostComputer", 0x013C, types::ASCII, D::Root),
    TagInfo::new("Predictor", PREDICTOR, types::SHORT, D::Root).with_count(1),
    TagInfo::new("WhitePoint", 0x013E, types::RATIONAL, D::Root).with_count(2),
    TagInfo::new("PrimaryChromaticities", 0x013F, types::RATIONAL, D::Root).with_count(6),
    TagInfo::new("ColorMap", 0x0140, types::SHORT, D::Root),
    TagInfo::new("HalftoneHints", 0x0141, types::SHORT, D::Root).with_count(2),
    TagInfo::new("TileWidth", TILE_WIDTH, types::SHORT_OR_LONG, D::Root).with_count(1),
    TagInfo::new("TileLength", TILE_LENGTH, types::SHORT_OR_LONG, D::Root).with_count(1),
    TagInfo::new("TileOffsets", TILE_OFFSETS, types::SHORT_OR_LONG, D::Root),
    TagInfo::new("TileByteCounts", TILE_BYTE_COUNTS, types::SHORT_OR_LONG, D::Root),
    TagInfo::new("SubIFDs", 0x014A, types::LONG_OR_IFD, D::Root),
    TagInfo::new("InkSet", 0x014C, types::SHORT, D::Root).with_count(1),
    TagInfo::new("ExtraSamples", 0x0152, types::SHORT, D::Root),
    TagInfo::new("SampleFormat", SAMPLE_FORMAT, types::SHORT, D::Root),
    TagInfo::new("SMinSampleValue", 0x0154, types::ANY, D::Root),
    TagInfo::new("SMaxSampleValue", 0x0155, types::ANY, D::Root),
    TagInfo::new("JPEGProc", 0x0200, types::SHORT, D::Root).with_count(1),
    TagInfo::new("JPEGInterchangeFormat", JPEG_INTERCHANGE_FORMAT, types::LONG, D::Ifd1).with_count(1),
    TagInfo::new("JPEGInterchangeFormatLength", JPEG_INTERCHANGE_FORMAT_LENGTH, types::LONG, D::Ifd1)
        .with_count(1),
    TagInfo::new("JPEGRestartInterval", 0x0203, types::SHORT, D::Root).with_count(1),
    TagInfo::new("YCbCrCoefficients", 0x0211, types::RATIONAL, D::Root).with_count(3),
    TagInfo::new("YCbCrSubSampling", 0x0212, types::SHORT, D::Root).with_count(2),
    TagInfo::new("YCbCrPositioning", 0x0213, types::SHORT, D::Root).with_count(1),
    TagInfo::new("ReferenceBlackWhite", 0x0214, types::RATIONAL, D::Root).with_count(6),
    TagInfo::new("XMP", 0x02BC, types::BYTE_OR_UNDEFINED, D::Root),
    TagInfo::new("Rating", 0x4746, types::SHORT, D::Any).with_count(1),
    TagInfo::new("Copyright", 0x8298, types::ASCII, D::Root),
    TagInfo::new("ModelPixelScale", 0x830E, types::DOUBLE, D::Root).with_count(3),
    TagInfo::new("IPTC-NAA", 0x83BB, types::ANY, D::Root),
    TagInfo::new("ModelTiepoint", 0x8482, types::DOUBLE, D::Root),
    TagInfo::new("PhotoshopSettings", 0x8649, types::BYTE, D::Root),
    TagInfo::new("ModelTransformation", 0x85D8, types::DOUBLE, D::Root).with_count(16),
    TagInfo::new("ExifOffset", EXIF_OFFSET, types::LONG_OR_IFD, D::Any)
        .with_count(1)
        .with_format(TagFormat::Offset(DirectoryKind::Exif)),
    TagInfo::new("ICCProfile", 0x8773, types::UNDEFINED, D::Root),
    TagInfo::new("GeoKeyDirectory", 0x87AF, types::SHORT, D::Root),
    TagInfo::new("GeoDoubleParams", 0x87B0, types::DOUBLE, D::Root),
    TagInfo::new("GeoAsciiParams", 0x87B1, types::ASCII, D::Root),
    TagInfo::new("GPSInfo", GPS_INFO, types::LONG_OR_IFD, D::Any)
        .with_count(1)
        .with_format(TagFormat::Offset(DirectoryKind::Gps)),
    TagInfo::new("GDAL_METADATA", 0xA480, types::ASCII, D::Root),
    TagInfo::new("GDAL_NODATA", 0xA481, types::ASCII, D::Root),
];

/// Tags of the EXIF sub-directory
pub static EXIF_TAGS: &[TagInfo] = &[
    TagInfo::new("ExposureTime", 0x829A, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("FNumber", 0x829D, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("ExposureProgram", 0x8822, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("SpectralSensitivity", 0x8824, types::ASCII, D::Exif),
    TagInfo::new("ISO", 0x8827, types::SHORT, D::Exif),
    TagInfo::new("OECF", 0x8828, types::UNDEFINED, D::Exif),
    TagInfo::new("SensitivityType", 0x8830, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("ExifVersion", 0x9000, types::UNDEFINED, D::Exif).with_count(4),
    TagInfo::new("DateTimeOriginal", DATE_TIME_ORIGINAL, types::ASCII, D::Exif)
        .with_count(20)
        .with_format(TagFormat::DateTime),
    TagInfo::new("DateTimeDigitized", 0x9004, types::ASCII, D::Exif)
        .with_count(20)
        .with_format(TagFormat::DateTime),
    TagInfo::new("OffsetTime", 0x9010, types::ASCII, D::Exif),
    TagInfo::new("OffsetTimeOriginal", 0x9011, types::ASCII, D::Exif),
    TagInfo::new("OffsetTimeDigitized", 0x9012, types::ASCII, D::Exif),
    TagInfo::new("ComponentsConfiguration", 0x9101, types::UNDEFINED, D::Exif).with_count(4),
    TagInfo::new("CompressedBitsPerPixel", 0x9102, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("ShutterSpeedValue", 0x9201, types::SRATIONAL, D::Exif).with_count(1),
    TagInfo::new("ApertureValue", 0x9202, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("BrightnessValue", 0x9203, types::SRATIONAL, D::Exif).with_count(1),
    TagInfo::new("ExposureBiasValue", 0x9204, types::SRATIONAL, D::Exif).with_count(1),
    TagInfo::new("MaxApertureValue", 0x9205, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("SubjectDistance", 0x9206, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("MeteringMode", 0x9207, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("LightSource", 0x9208, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("Flash", 0x9209, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("FocalLength", 0x920A, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("SubjectArea", 0x9214, types::SHORT, D::Exif),
    TagInfo::new("MakerNote", MAKER_NOTE, types::UNDEFINED, D::Exif),
    TagInfo::new("UserComment", USER_COMMENT, types::UNDEFINED, D::Exif)
        .with_format(TagFormat::EncodedText),
    TagInfo::new("SubSecTime", 0x9290, types::ASCII, D::Exif),
    TagInfo::new("SubSecTimeOriginal", 0x9291, types::ASCII, D::Exif),
    TagInfo::new("SubSecTimeDigitized", 0x9292, types::ASCII, D::Exif),
    TagInfo::new("FlashpixVersion", 0xA000, types::UNDEFINED, D::Exif).with_count(4),
    TagInfo::new("ColorSpace", 0xA001, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("ExifImageWidth", 0xA002, types::SHORT_OR_LONG, D::Exif).with_count(1),
    TagInfo::new("ExifImageLength", 0xA003, types::SHORT_OR_LONG, D::Exif).with_count(1),
    TagInfo::new("RelatedSoundFile", 0xA004, types::ASCII, D::Exif).with_count(13),
    TagInfo::new("InteropOffset", INTEROP_OFFSET, types::LONG_OR_IFD, D::Any)
        .with_count(1)
        .with_format(TagFormat::Offset(DirectoryKind::Interoperability)),
    TagInfo::new("FlashEnergy", 0xA20B, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("SpatialFrequencyResponse", 0xA20C, types::UNDEFINED, D::Exif),
    TagInfo::new("FocalPlaneXResolution", 0xA20E, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("FocalPlaneYResolution", 0xA20F, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("FocalPlaneResolutionUnit", 0xA210, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("SubjectLocation", 0xA214, types::SHORT, D::Exif).with_count(2),
    TagInfo::new("ExposureIndex", 0xA215, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("SensingMethod", 0xA217, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("FileSource", 0xA300, types::UNDEFINED, D::Exif).with_count(1),
    TagInfo::new("SceneType", 0xA301, types::UNDEFINED, D::Exif).with_count(1),
    TagInfo::new("CFAPattern", 0xA302, types::UNDEFINED, D::Exif),
    TagInfo::new("CustomRendered", 0xA401, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("ExposureMode", 0xA402, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("WhiteBalance", 0xA403, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("DigitalZoomRatio", 0xA404, types::RATIONAL, D::Exif).with_count(1),
    TagInfo::new("FocalLengthIn35mmFormat", 0xA405, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("SceneCaptureType", 0xA406, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("GainControl", 0xA407, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("Contrast", 0xA408, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("Saturation", 0xA409, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("Sharpness", 0xA40A, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("DeviceSettingDescription", 0xA40B, types::UNDEFINED, D::Exif),
    TagInfo::new("SubjectDistanceRange", 0xA40C, types::SHORT, D::Exif).with_count(1),
    TagInfo::new("ImageUniqueID", 0xA420, types::ASCII, D::Exif).with_count(33),
    TagInfo::new("OwnerName", 0xA430, types::ASCII, D::Exif),
    TagInfo::new("SerialNumber", 0xA431, types::ASCII, D::Exif),
    TagInfo::new("LensSpecification", 0xA432, types::RATIONAL, D::Exif).with_count(4),
    TagInfo::new("LensMake", 0xA433, types::ASCII, D::Exif),
    TagInfo::new("LensModel", 0xA434, types::ASCII, D::Exif),
    TagInfo::new("LensSerialNumber", 0xA435, types::ASCII, D::Exif),
    TagInfo::new("Gamma", 0xA500, types::RATIONAL, D::Exif).with_count(1),
];

/// Tags of the GPS sub-directory
pub static GPS_TAGS: &[TagInfo] = &[
    TagInfo::new("GPSVersionID", GPS_VERSION_ID, types::BYTE, D::Gps).with_count(4),
    TagInfo::new("GPSLatitudeRef", GPS_LATITUDE_REF, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSLatitude", GPS_LATITUDE, types::RATIONAL, D::Gps).with_count(3),
    TagInfo::new("GPSLongitudeRef", GPS_LONGITUDE_REF, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSLongitude", GPS_LONGITUDE, types::RATIONAL, D::Gps).with_count(3),
    TagInfo::new("GPSAltitudeRef", GPS_ALTITUDE_REF, types::BYTE, D::Gps).with_count(1),
    TagInfo::new("GPSAltitude", GPS_ALTITUDE, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSTimeStamp", 0x0007, types::RATIONAL, D::Gps).with_count(3),
    TagInfo::new("GPSSatellites", 0x0008, types::ASCII, D::Gps),
    TagInfo::new("GPSStatus", 0x0009, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSMeasureMode", 0x000A, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSDOP", 0x000B, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSSpeedRef", 0x000C, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSSpeed", 0x000D, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSTrackRef", 0x000E, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSTrack", 0x000F, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSImgDirectionRef", 0x0010, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSImgDirection", 0x0011, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSMapDatum", 0x0012, types::ASCII, D::Gps),
    TagInfo::new("GPSDestLatitudeRef", 0x0013, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSDestLatitude", 0x0014, types::RATIONAL, D::Gps).with_count(3),
    TagInfo::new("GPSDestLongitudeRef", 0x0015, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSDestLongitude", 0x0016, types::RATIONAL, D::Gps).with_count(3),
    TagInfo::new("GPSDestBearingRef", 0x0017, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSDestBearing", 0x0018, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSDestDistanceRef", 0x0019, types::ASCII, D::Gps).with_count(2),
    TagInfo::new("GPSDestDistance", 0x001A, types::RATIONAL, D::Gps).with_count(1),
    TagInfo::new("GPSProcessingMethod", GPS_PROCESSING_METHOD, types::BYTE_OR_UNDEFINED, D::Gps)
        .with_format(TagFormat::EncodedText),
    TagInfo::new("GPSAreaInformation", 0x001C, types::BYTE_OR_UNDEFINED, D::Gps)
        .with_format(TagFormat::EncodedText),
    TagInfo::new("GPSDateStamp", 0x001D, types::ASCII, D::Gps).with_count(11),
    TagInfo::new("GPSDifferential", 0x001E, types::SHORT, D::Gps).with_count(1),
    TagInfo::new("GPSHPositioningError", 0x001F, types::RATIONAL, D::Gps).with_count(1),
];

/// Tags of the Interoperability sub-directory
pub static INTEROP_TAGS: &[TagInfo] = &[
    TagInfo::new("InteroperabilityIndex", INTEROPERABILITY_INDEX, types::ASCII, D::Interop),
    TagInfo::new("InteroperabilityVersion", INTEROPERABILITY_VERSION, types::UNDEFINED, D::Interop)
        .with_count(4),
    TagInfo::new("RelatedImageFileFormat", 0x1000, types::ASCII, D::Interop),
    TagInfo::new("RelatedImageWidth", 0x1001, types::SHORT_OR_LONG, D::Interop).with_count(1),
    TagInfo::new("RelatedImageLength", 0x1002, types::SHORT_OR_LONG, D::Interop).with_count(1),
];

/// Windows Explorer tags
pub static XP_TAGS: &[TagInfo] = &[
    TagInfo::new("XPTitle", XP_TITLE, types::BYTE, D::Root).with_format(TagFormat::XpString),
    TagInfo::new("XPComment", 0x9C9C, types::BYTE, D::Root).with_format(TagFormat::XpString),
    TagInfo::new("XPAuthor", 0x9C9D, types::BYTE, D::Root).with_format(TagFormat::XpString),
    TagInfo::new("XPKeywords", 0x9C9E, types::BYTE, D::Root).with_format(TagFormat::XpString),
    TagInfo::new("XPSubject", 0x9C9F, types::BYTE, D::Root).with_format(TagFormat::XpString),
];

static REGISTRY: LazyLock<TagRegistry> =
    LazyLock::new(|| TagRegistry::from_tables(&[TIFF_TAGS, EXIF_TAGS, GPS_TAGS, INTEROP_TAGS, XP_TAGS]));

/// Immutable map from tag id to its candidate definitions
#[derive(Debug, Default)]
pub struct TagRegistry {
    by_id: HashMap<u16, Vec<&'static TagInfo>>,
}

impl TagRegistry {
    /// The registry over every built-in table
    pub fn global() -> &'static TagRegistry {
        &REGISTRY
    }

    pub fn from_tags(tags: &'static [TagInfo]) -> Self {
        Self::from_tables(&[tags])
    }

    /// Builds a registry; candidates keep table order
    pub fn from_tables(tables: &[&'static [TagInfo]]) -> Self {
        let mut by_id: HashMap<u16, Vec<&'static TagInfo>> = HashMap::new();
        for info in tables.iter().flat_map(|table| table.iter()) {
            by_id.entry(info.tag).or_default().push(info);
        }
        Self { by_id }
    }

    pub fn candidates(&self, tag: u16) -> &[&'static TagInfo] {
        self.by_id.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_id.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolves `tag` as found in a directory of kind `kind`
    ///
    /// Rules, first hit wins: a definition owned by exactly this directory;
    /// one from the same category (image or metadata directories); one valid
    /// in any directory; [`UNKNOWN`].
    pub fn resolve(&self, kind: DirectoryKind, tag: u16) -> &'static TagInfo {
        let candidates = self.candidates(tag);
        let specific = || candidates.iter().copied().filter(|c| c.directory != TagDirectory::Any);

        if let Some(exact) = specific().find(|c| c.directory.matches(kind)) {
            return exact;
        }
        if let Some(same_category) = specific().find(|c| c.directory.is_image() == kind.is_image()) {
            return same_category;
        }
        candidates
            .iter()
            .copied()
            .find(|c| c.directory == TagDirectory::Any)
            .unwrap_or(&UNKNOWN)
    }
}

/// Resolves a tag against the built-in registry
pub fn resolve(kind: DirectoryKind, tag: u16) -> &'static TagInfo {
    REGISTRY.resolve(kind, tag)
}

/// Display name of a tag; unknown ids are shown in hex
pub fn tag_name(kind: DirectoryKind, tag: u16) -> String {
    let info = resolve(kind, tag);
    if info.is_unknown() {
        format!("Unknown Tag (0x{:04x})", tag)
    } else {
        info.name.to_string()
    }
}
