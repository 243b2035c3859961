//! TIFF container support

pub mod element;
pub mod field_type;
pub mod gps;
pub mod ifd;
pub mod reader;
pub mod tags;
pub mod types;

pub use element::{ElementKind, LayoutIssue, TiffElement};
pub use field_type::{FieldType, FieldValue};
pub use gps::{Dms, GpsInfo};
pub use ifd::{DataElement, DirectoryKind, ImageData, TiffDirectory, TiffField};
pub use reader::{
    decompress_block, Collector, FirstDirectoryCollector, Flow, Listener, MetadataCollector, ReadOutcome,
    TiffReader,
};
pub use tags::{TagDirectory, TagFormat, TagInfo, TagRegistry};
pub use types::{TiffContents, TiffHeader};

/// TIFF version number (42)
pub const TIFF_VERSION: u16 = 42;
