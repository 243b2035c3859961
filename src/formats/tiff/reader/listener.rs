//! Walk steering
//!
//! The reader owns the parsed directories; a [`Listener`] only decides what
//! gets read and when the walk ends.

use crate::formats::tiff::ifd::{DirectoryKind, TiffDirectory, TiffField};
use crate::formats::tiff::types::TiffHeader;

/// Whether the walk goes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Receives walk events in order
pub trait Listener {
    fn on_header(&mut self, _header: &TiffHeader) -> Flow {
        Flow::Continue
    }

    fn on_field(&mut self, _field: &TiffField) -> Flow {
        Flow::Continue
    }

    /// Called once per directory, after its fields and image data are read
    fn on_directory(&mut self, directory: &TiffDirectory) -> Flow;

    /// Whether strip, tile and thumbnail payloads are fetched
    fn wants_image_data(&self) -> bool;

    /// Whether EXIF, GPS and Interoperability pointers are followed
    fn wants_offset_directories(&self) -> bool {
        true
    }
}

/// Reads every directory
#[derive(Debug, Default)]
pub struct Collector {
    read_thumbnails: bool,
    seen: Vec<(DirectoryKind, u64)>,
}

impl Collector {
    pub fn new(read_thumbnails: bool) -> Self {
        Self {
            read_thumbnails,
            seen: Vec::new(),
        }
    }

    /// Kind and offset of each directory in visit order
    pub fn seen(&self) -> &[(DirectoryKind, u64)] {
        &self.seen
    }
}

impl Listener for Collector {
    fn on_directory(&mut self, directory: &TiffDirectory) -> Flow {
        self.seen.push((directory.kind, directory.offset));
        Flow::Continue
    }

    fn wants_image_data(&self) -> bool {
        self.read_thumbnails
    }
}

/// Reads the root directory only
#[derive(Debug, Default)]
pub struct FirstDirectoryCollector {
    read_image_data: bool,
}

impl FirstDirectoryCollector {
    pub fn new(read_image_data: bool) -> Self {
        Self { read_image_data }
    }
}

impl Listener for FirstDirectoryCollector {
    fn on_directory(&mut self, _directory: &TiffDirectory) -> Flow {
        Flow::Stop
    }

    fn wants_image_data(&self) -> bool {
        self.read_image_data
    }

    fn wants_offset_directories(&self) -> bool {
        false
    }
}

/// Reads every directory without image payloads
#[derive(Debug, Default)]
pub struct MetadataCollector {
    inner: Collector,
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> &[(DirectoryKind, u64)] {
        self.inner.seen()
    }
}

impl Listener for MetadataCollector {
    fn on_directory(&mut self, directory: &TiffDirectory) -> Flow {
        self.inner.on_directory(directory)
    }

    fn wants_image_data(&self) -> bool {
        false
    }
}
