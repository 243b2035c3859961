//! TIFF data structures

use std::fmt;

use serde::Serialize;

use super::element::{self, LayoutIssue, TiffElement};
use super::gps::GpsInfo;
use super::ifd::{DirectoryKind, TiffDirectory, TiffField};
use super::TIFF_VERSION;
use crate::error::{Error, Result};
use crate::io::ByteOrder;

/// The 8-byte file header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TiffHeader {
    pub byte_order: ByteOrder,
    pub version: u16,
    /// Offset of the first directory
    pub first_offset: u32,
}

impl TiffHeader {
    /// Size of the header in bytes
    pub const LENGTH: usize = 8;

    pub fn new(byte_order: ByteOrder, first_offset: u32) -> Self {
        Self {
            byte_order,
            version: TIFF_VERSION,
            first_offset,
        }
    }

    /// Parses the header from the first 8 bytes of a container
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::LENGTH {
            return Err(Error::InvalidFormat(format!(
                "Header needs {} bytes, got {}",
                Self::LENGTH,
                bytes.len()
            )));
        }
        let marker = [bytes[0], bytes[1]];
        let byte_order = ByteOrder::from_tiff_magic(marker)
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes(marker)))?;

        let version = byte_order.decode_u16(bytes, 2)?;
        if version != TIFF_VERSION {
            return Err(Error::InvalidVersion(version));
        }
        let first_offset = byte_order.decode_u32(bytes, 4)?;

        Ok(Self {
            byte_order,
            version,
            first_offset,
        })
    }

    pub fn encode(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[..2].copy_from_slice(&self.byte_order.tiff_magic());
        bytes[2..4].copy_from_slice(&self.byte_order.encode_u16(self.version));
        bytes[4..].copy_from_slice(&self.byte_order.encode_u32(self.first_offset));
        bytes
    }
}

impl fmt::Display for TiffHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TIFF {} (version {}), first directory at {}",
            self.byte_order.name(),
            self.version,
            self.first_offset
        )
    }
}

/// Result of a directory walk: the header and directories in visit order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TiffContents {
    pub header: TiffHeader,
    pub directories: Vec<TiffDirectory>,
}

impl TiffContents {
    pub fn new(header: TiffHeader, directories: Vec<TiffDirectory>) -> Self {
        Self { header, directories }
    }

    /// First field with `tag` in any directory
    pub fn find_field(&self, tag: u16) -> Option<&TiffField> {
        self.directories.iter().find_map(|dir| dir.find_field(tag))
    }

    /// First directory of the given kind
    pub fn directory(&self, kind: DirectoryKind) -> Option<&TiffDirectory> {
        self.directories.iter().find(|dir| dir.kind == kind)
    }

    pub fn root(&self) -> Option<&TiffDirectory> {
        self.directory(DirectoryKind::ROOT)
    }

    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    /// Decoded GPS directory, `None` when the container has none
    pub fn gps(&self) -> Result<Option<GpsInfo>> {
        self.directory(DirectoryKind::Gps)
            .map(GpsInfo::from_directory)
            .transpose()
    }

    /// Every positioned structure of the container
    pub fn elements(&self) -> Vec<TiffElement> {
        element::collect(self)
    }

    /// Sorts the elements by offset and reports gaps and overlaps
    pub fn dissect(&self) -> Vec<LayoutIssue> {
        element::dissect(self.elements())
    }
}

impl fmt::Display for TiffContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        writeln!(f, "Number of directories: {}", self.directories.len())?;
        for dir in &self.directories {
            writeln!(f)?;
            write!(f, "{}", dir)?;
        }
        Ok(())
    }
}
