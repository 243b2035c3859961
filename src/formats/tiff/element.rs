//! Byte layout of a parsed container
//!
//! Every structure the reader located (header, directories, oversized
//! values, image blocks, thumbnails) is a [`TiffElement`]. Sorting them by
//! offset exposes unused gaps and overlapping structures.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::ifd::DirectoryKind;
use super::types::{TiffContents, TiffHeader};

/// What occupies a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ElementKind {
    Header,
    Directory(DirectoryKind),
    /// Oversized value of a field
    Value { directory: DirectoryKind, tag: u16 },
    /// Strip or tile of a directory
    ImageData(DirectoryKind),
    JpegThumbnail(DirectoryKind),
}

/// A positioned byte range of the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TiffElement {
    pub offset: u64,
    pub length: u64,
    pub kind: ElementKind,
}

impl TiffElement {
    pub fn new(offset: u64, length: u64, kind: ElementKind) -> Self {
        Self { offset, length, kind }
    }

    /// First offset past the element
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}

impl fmt::Display for TiffElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            ElementKind::Header => "Header".to_string(),
            ElementKind::Directory(kind) => format!("{} directory", kind),
            ElementKind::Value { directory, tag } => format!("{} value 0x{:04x}", directory, tag),
            ElementKind::ImageData(kind) => format!("{} image data", kind),
            ElementKind::JpegThumbnail(kind) => format!("{} JPEG thumbnail", kind),
        };
        write!(f, "{}..{}: {} ({} bytes)", self.offset, self.end(), what, self.length)
    }
}

/// A problem found between two neighbouring elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LayoutIssue {
    /// Bytes no element accounts for
    Gap { offset: u64, length: u64 },
    /// Two elements share bytes
    Overlap { first: TiffElement, second: TiffElement },
}

impl fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutIssue::Gap { offset, length } => write!(f, "gap of {} bytes at {}", length, offset),
            LayoutIssue::Overlap { first, second } => write!(f, "overlap: [{}] and [{}]", first, second),
        }
    }
}

pub(crate) fn collect(contents: &TiffContents) -> Vec<TiffElement> {
    let mut elements = vec![TiffElement::new(0, TiffHeader::LENGTH as u64, ElementKind::Header)];

    for dir in &contents.directories {
        elements.push(TiffElement::new(dir.offset, dir.length(), ElementKind::Directory(dir.kind)));

        for field in dir.fields.iter().filter(|f| f.is_oversized()) {
            elements.push(TiffElement::new(
                field.offset() as u64,
                field.value_bytes.len() as u64,
                ElementKind::Value {
                    directory: dir.kind,
                    tag: field.tag,
                },
            ));
        }

        if let Some(image_data) = &dir.image_data {
            for block in image_data.blocks() {
                elements.push(TiffElement::new(block.offset, block.length, ElementKind::ImageData(dir.kind)));
            }
        }

        if let Some(jpeg) = &dir.jpeg_data {
            elements.push(TiffElement::new(jpeg.offset, jpeg.length, ElementKind::JpegThumbnail(dir.kind)));
        }
    }

    elements
}

/// Sorts `elements` by offset and reports gaps and overlaps between them
///
/// Single padding bytes after odd-length elements are not gaps: TIFF aligns
/// values on word boundaries.
pub fn dissect(mut elements: Vec<TiffElement>) -> Vec<LayoutIssue> {
    elements.sort_by_key(|e| (e.offset, e.length));

    let mut issues = Vec::new();
    let mut previous: Option<TiffElement> = None;

    for element in elements {
        debug!("{}", element);
        if let Some(prev) = previous {
            if element.offset < prev.end() {
                let issue = LayoutIssue::Overlap {
                    first: prev,
                    second: element,
                };
                debug!("{}", issue);
                issues.push(issue);
            } else if element.offset > prev.end() {
                let length = element.offset - prev.end();
                let padding = length == 1 && prev.end() % 2 == 1;
                if !padding {
                    let issue = LayoutIssue::Gap {
                        offset: prev.end(),
                        length,
                    };
                    debug!("{}", issue);
                    issues.push(issue);
                }
            }
        }
        previous = match previous {
            Some(prev) if prev.end() > element.end() => Some(prev),
            _ => Some(element),
        };
    }

    issues
}
