//! Synthetic TIFF byte streams for integration tests

#![allow(dead_code)]

use tiffscope::{ByteOrder, FieldType};

/// One directory entry before layout
#[derive(Debug, Clone)]
pub struct Entry {
    pub tag: u16,
    pub field_type: FieldType,
    pub count: u32,
    pub value: [u8; 4],
}

impl Entry {
    pub fn short(order: ByteOrder, tag: u16, value: u16) -> Self {
        let mut bytes = [0u8; 4];
        bytes[..2].copy_from_slice(&order.encode_u16(value));
        Self {
            tag,
            field_type: FieldType::Short,
            count: 1,
            value: bytes,
        }
    }

    pub fn long(order: ByteOrder, tag: u16, value: u32) -> Self {
        Self {
            tag,
            field_type: FieldType::Long,
            count: 1,
            value: order.encode_u32(value),
        }
    }

    /// ASCII value of at most 4 bytes including the NUL
    pub fn ascii(tag: u16, text: &[u8]) -> Self {
        let mut bytes = [0u8; 4];
        bytes[..text.len()].copy_from_slice(text);
        Self {
            tag,
            field_type: FieldType::Ascii,
            count: text.len() as u32,
            value: bytes,
        }
    }

    /// Entry whose value lives at `offset`
    pub fn at(order: ByteOrder, tag: u16, field_type: FieldType, count: u32, offset: u32) -> Self {
        Self {
            tag,
            field_type,
            count,
            value: order.encode_u32(offset),
        }
    }

    pub fn raw(tag: u16, type_code: u16, count: u32, value: [u8; 4]) -> Self {
        Self {
            tag,
            field_type: FieldType::from_code(type_code),
            count,
            value,
        }
    }
}

/// Assembles a container by placing structures at explicit offsets
pub struct TiffBuilder {
    pub order: ByteOrder,
    pub bytes: Vec<u8>,
}

impl TiffBuilder {
    pub fn new(order: ByteOrder, first_offset: u32) -> Self {
        let mut builder = Self { order, bytes: Vec::new() };
        let mut header = order.tiff_magic().to_vec();
        header.extend_from_slice(&order.encode_u16(42));
        header.extend_from_slice(&order.encode_u32(first_offset));
        builder.put(0, &header);
        builder
    }

    pub fn put(&mut self, offset: usize, data: &[u8]) -> &mut Self {
        if self.bytes.len() < offset + data.len() {
            self.bytes.resize(offset + data.len(), 0);
        }
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
        self
    }

    pub fn directory(&mut self, offset: usize, entries: &[Entry], next: u32) -> &mut Self {
        let order = self.order;
        let mut data = order.encode_u16(entries.len() as u16).to_vec();
        for entry in entries {
            data.extend_from_slice(&order.encode_u16(entry.tag));
            data.extend_from_slice(&order.encode_u16(entry.field_type.code()));
            data.extend_from_slice(&order.encode_u32(entry.count));
            data.extend_from_slice(&entry.value);
        }
        data.extend_from_slice(&order.encode_u32(next));
        self.put(offset, &data)
    }

    pub fn build(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

/// Size of a directory with `entries` entries
pub fn directory_size(entries: usize) -> usize {
    2 + 12 * entries + 4
}
