//! TIFF reader modules
//!
//! Directories are walked with an explicit work list in depth-first
//! pre-order: a directory, then its EXIF, GPS and Interoperability children
//! with their subtrees, then the next directory of the chain. Every offset
//! is read at most once, so aliased and cyclic pointers terminate and a
//! chain can never hold more directories than the source has room for.

pub mod entries;
pub mod image_data;
pub mod listener;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::compliance::FormatCompliance;
use crate::error::{Error, Result};
use crate::formats::tiff::ifd::{DirectoryKind, TiffDirectory, TiffField, ENTRY_SIZE};
use crate::formats::tiff::tags;
use crate::formats::tiff::types::{TiffContents, TiffHeader};
use crate::io::{ByteOrder, ByteSource};
use crate::options::ReadOptions;

use self::entries::{check_field, parse_entries, ValueReader};
pub use self::image_data::{decompress_block, expected_block_length};
pub use self::listener::{Collector, FirstDirectoryCollector, Flow, Listener, MetadataCollector};

/// Pointer tags followed into sub-directories, in visit order
const OFFSET_DIRECTORIES: [(u16, DirectoryKind); 3] = [
    (tags::EXIF_OFFSET, DirectoryKind::Exif),
    (tags::GPS_INFO, DirectoryKind::Gps),
    (tags::INTEROP_OFFSET, DirectoryKind::Interoperability),
];

/// How reading one directory ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Continue,
    /// The listener ended the walk
    Stop,
    /// The offset was read before; nothing was read
    AlreadyVisited,
    /// The directory is missing or cut short by the end of the source
    Truncated,
}

/// A scheduled directory read
#[derive(Debug, Clone, Copy)]
struct WorkItem {
    offset: u64,
    kind: DirectoryKind,
    ignore_next: bool,
    /// Directory index and pointer tag that scheduled this read
    origin: Option<(usize, u16)>,
}

/// Walk state shared by all directory reads
struct Walk<'l> {
    listener: &'l mut dyn Listener,
    byte_order: ByteOrder,
    visited: HashSet<u64>,
    directories: Vec<TiffDirectory>,
    pending: Vec<WorkItem>,
}

/// TIFF container reader over a byte source
pub struct TiffReader<'a> {
    source: &'a dyn ByteSource,
    options: ReadOptions,
    compliance: FormatCompliance,
}

impl<'a> TiffReader<'a> {
    pub fn new(source: &'a dyn ByteSource, options: ReadOptions) -> Self {
        let description = source.filename().unwrap_or("TIFF").to_string();
        Self {
            source,
            options,
            compliance: FormatCompliance::new(description, options.strict),
        }
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    /// Deviations recorded so far
    pub fn compliance(&self) -> &FormatCompliance {
        &self.compliance
    }

    pub fn into_compliance(self) -> FormatCompliance {
        self.compliance
    }

    /// Reads and validates the 8-byte header
    pub fn read_header(&mut self) -> Result<TiffHeader> {
        let bytes = self.source.block(0, TiffHeader::LENGTH)?;
        let header = TiffHeader::parse(&bytes)?;
        debug!("{}", header);
        Ok(header)
    }

    /// Reads every directory; image data only when thumbnails are requested
    pub fn read_contents(&mut self) -> Result<TiffContents> {
        let mut collector = Collector::new(self.options.read_thumbnails);
        self.read_directories(&mut collector)
    }

    /// Reads the root directory only
    pub fn read_first_directory(&mut self) -> Result<Option<TiffDirectory>> {
        let mut collector = FirstDirectoryCollector::new(self.options.read_thumbnails);
        let contents = self.read_directories(&mut collector)?;
        Ok(contents.directories.into_iter().next())
    }

    /// Reads every directory without image data
    pub fn read_metadata(&mut self) -> Result<TiffContents> {
        self.read_directories(&mut MetadataCollector::new())
    }

    /// Walks all reachable directories, steered by `listener`
    pub fn read_directories(&mut self, listener: &mut dyn Listener) -> Result<TiffContents> {
        let header = self.read_header()?;
        if listener.on_header(&header) == Flow::Stop {
            return Ok(TiffContents::new(header, Vec::new()));
        }

        let mut walk = Walk {
            listener,
            byte_order: header.byte_order,
            visited: HashSet::from([0]),
            directories: Vec::new(),
            pending: vec![WorkItem {
                offset: header.first_offset as u64,
                kind: DirectoryKind::ROOT,
                ignore_next: false,
                origin: None,
            }],
        };

        while let Some(item) = walk.pending.pop() {
            match self.read_directory(&mut walk, item)? {
                ReadOutcome::Stop => {
                    debug!("Walk stopped by listener");
                    break;
                }
                ReadOutcome::AlreadyVisited => {
                    if let Some((parent, tag)) = item.origin {
                        debug!(
                            "{} directory at {} already read, dropping pointer 0x{:04x}",
                            item.kind, item.offset, tag
                        );
                        walk.directories[parent].remove_field(tag);
                    }
                }
                ReadOutcome::Continue | ReadOutcome::Truncated => {}
            }
        }

        Ok(TiffContents::new(header, walk.directories))
    }

    fn read_directory(&mut self, walk: &mut Walk<'_>, item: WorkItem) -> Result<ReadOutcome> {
        if !walk.visited.insert(item.offset) {
            return Ok(ReadOutcome::AlreadyVisited);
        }

        let source_len = self.source.len()?;
        if item.offset >= source_len {
            warn!("{} directory offset {} is beyond the end of the source", item.kind, item.offset);
            self.compliance.note(format!(
                "{} directory offset {} beyond end of source ({} bytes)",
                item.kind, item.offset, source_len
            ));
            return Ok(ReadOutcome::Truncated);
        }
        debug!("Reading {} directory at {}", item.kind, item.offset);

        let order = walk.byte_order;
        let strict = self.options.strict;

        let entry_count = match self.source.block(item.offset, 2) {
            Ok(bytes) => order.decode_u16(&bytes, 0)? as u64,
            Err(e) if !strict => {
                warn!("{} directory at {}: entry count unreadable: {}", item.kind, item.offset, e);
                self.compliance
                    .add_comment_value("Directory entry count unreadable at offset", item.offset as i64)?;
                return Ok(ReadOutcome::Truncated);
            }
            Err(e) => return Err(e),
        };

        let entries_start = item.offset + 2;
        let entries_length = entry_count * ENTRY_SIZE;
        let available = source_len - entries_start.min(source_len);
        let mut truncated = entries_length > available;
        if truncated {
            if strict {
                return Err(Error::RangeOutOfBounds {
                    offset: entries_start,
                    length: entries_length,
                    size: source_len,
                });
            }
            warn!(
                "{} directory at {}: {} entries declared, source ends after {}",
                item.kind,
                item.offset,
                entry_count,
                available / ENTRY_SIZE
            );
            self.compliance.add_comment(format!(
                "{} directory at {} truncated: {} of {} entries present",
                item.kind,
                item.offset,
                available / ENTRY_SIZE,
                entry_count
            ))?;
        }

        let entry_bytes = self.source.block(entries_start, entries_length.min(available) as usize)?;
        let raw_entries = parse_entries(&entry_bytes, order)?;
        let values = ValueReader::new(self.source, order);

        let mut directory = TiffDirectory::new(item.kind, item.offset, order);
        directory.raw_entry_count = raw_entries.len();
        for entry in raw_entries {
            if entry.tag == 0 {
                debug!("{} directory: dropping entry {} with tag 0", item.kind, entry.index);
                continue;
            }

            let value_bytes = match values.read_value(&entry) {
                Ok(bytes) => bytes,
                Err(e) if !strict => {
                    warn!("{} directory: dropping tag 0x{:04x}: {}", item.kind, entry.tag, e);
                    self.compliance.add_comment(format!(
                        "{} directory: value of tag 0x{:04x} unreadable",
                        item.kind, entry.tag
                    ))?;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let field = TiffField::new(
                entry.tag,
                item.kind,
                entry.type_code,
                entry.count,
                entry.offset_bytes,
                value_bytes,
                order,
            )
            .with_sort_hint(entry.index);
            check_field(&field, &mut self.compliance)?;

            if walk.listener.on_field(&field) == Flow::Stop {
                return Ok(ReadOutcome::Stop);
            }
            directory.add_field(field);
        }

        if !truncated {
            match self.source.block(entries_start + entries_length, 4) {
                Ok(bytes) => directory.next_offset = order.decode_u32(&bytes, 0)? as u64,
                Err(e) if !strict => {
                    warn!("{} directory at {}: next offset unreadable: {}", item.kind, item.offset, e);
                    self.compliance
                        .add_comment_value("Next directory offset unreadable in directory at", item.offset as i64)?;
                    truncated = true;
                }
                Err(e) => return Err(e),
            }
        }

        if walk.listener.wants_image_data() {
            directory.image_data = image_data::read_image_data(self.source, &directory)?;
            directory.jpeg_data =
                image_data::read_jpeg_thumbnail(self.source, &directory, strict, &mut self.compliance)?;
        }

        let flow = walk.listener.on_directory(&directory);
        let index = walk.directories.len();
        let next = (directory.next_offset != 0 && !item.ignore_next).then(|| WorkItem {
            offset: directory.next_offset,
            kind: item.kind.next(),
            ignore_next: false,
            origin: None,
        });
        walk.directories.push(directory);

        if flow == Flow::Stop {
            return Ok(ReadOutcome::Stop);
        }

        let children = if walk.listener.wants_offset_directories() {
            self.offset_directories(walk, index)?
        } else {
            Vec::new()
        };

        // The stack pops the last push first: next directory below children.
        walk.pending.extend(next);
        walk.pending.extend(children.into_iter().rev());

        Ok(if truncated {
            ReadOutcome::Truncated
        } else {
            ReadOutcome::Continue
        })
    }

    /// Schedules the sub-directories the pointer fields of directory `index` name
    fn offset_directories(&mut self, walk: &mut Walk<'_>, index: usize) -> Result<Vec<WorkItem>> {
        let mut children = Vec::new();

        for (tag, kind) in OFFSET_DIRECTORIES {
            let directory = &mut walk.directories[index];
            let Some(field) = directory.find_field(tag) else {
                continue;
            };

            match field.int_value() {
                Ok(offset) => children.push(WorkItem {
                    offset: offset as u64,
                    kind,
                    ignore_next: true,
                    origin: Some((index, tag)),
                }),
                Err(e) if !self.options.strict => {
                    warn!("{} directory: unreadable {} pointer: {}", directory.kind, kind, e);
                    self.compliance.add_comment(format!(
                        "{} directory: {} pointer is not an offset",
                        directory.kind, kind
                    ))?;
                    directory.remove_field(tag);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{ByteSourceArray, ByteSourceFile};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn minimal_tiff() -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"II");
        bytes.extend_from_slice(&42u16.to_le_bytes());
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&256u16.to_le_bytes());
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&1024u32.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes
    }

    #[test]
    fn test_read_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&minimal_tiff()).unwrap();
        file.flush().unwrap();

        let source = ByteSourceFile::open(file.path()).unwrap();
        let mut reader = TiffReader::new(&source, ReadOptions::default());
        let contents = reader.read_contents().unwrap();
        assert_eq!(contents.directory_count(), 1);
        assert_eq!(contents.root().unwrap().required_int(tags::IMAGE_WIDTH).unwrap(), 1024);
        assert!(reader.compliance().is_empty());
    }

    #[test]
    fn test_first_offset_beyond_source() {
        let mut bytes = minimal_tiff();
        bytes[4..8].copy_from_slice(&500u32.to_le_bytes());
        let source = ByteSourceArray::new(bytes);

        let mut reader = TiffReader::new(&source, ReadOptions::strict());
        let contents = reader.read_contents().unwrap();
        assert_eq!(contents.directory_count(), 0);
        assert_eq!(reader.compliance().comments().len(), 1);
    }

    #[test]
    fn test_zero_first_offset() {
        let mut bytes = minimal_tiff();
        bytes[4..8].copy_from_slice(&0u32.to_le_bytes());
        let source = ByteSourceArray::new(bytes);
        let contents = TiffReader::new(&source, ReadOptions::default()).read_contents().unwrap();
        assert!(contents.directories.is_empty());
    }

    #[test]
    fn test_short_header() {
        let source = ByteSourceArray::new(b"II*\0".to_vec());
        let err = TiffReader::new(&source, ReadOptions::default()).read_contents().unwrap_err();
        assert!(matches!(err, Error::RangeOutOfBounds { .. }));
    }

    #[test]
    fn test_listener_stop_on_header() {
        struct HeaderOnly;
        impl Listener for HeaderOnly {
            fn on_header(&mut self, _header: &TiffHeader) -> Flow {
                Flow::Stop
            }
            fn on_directory(&mut self, _directory: &TiffDirectory) -> Flow {
                Flow::Continue
            }
            fn wants_image_data(&self) -> bool {
                false
            }
        }

        let source = ByteSourceArray::new(minimal_tiff());
        let contents = TiffReader::new(&source, ReadOptions::default())
            .read_directories(&mut HeaderOnly)
            .unwrap();
        assert_eq!(contents.header.first_offset, 8);
        assert!(contents.directories.is_empty());
    }

    #[test]
    fn test_truncated_entries() {
        let mut bytes = minimal_tiff();
        // Declare three entries where only one is present.
        bytes[8..10].copy_from_slice(&3u16.to_le_bytes());
        let source = ByteSourceArray::new(bytes.clone());

        let mut reader = TiffReader::new(&source, ReadOptions::default());
        let contents = reader.read_contents().unwrap();
        let root = contents.root().unwrap();
        assert_eq!(root.entry_count(), 1);
        assert_eq!(root.next_offset, 0);
        assert_eq!(reader.compliance().comments().len(), 1);

        let mut strict = TiffReader::new(&source, ReadOptions::strict());
        assert!(strict.read_contents().is_err());
    }
}
