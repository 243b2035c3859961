//! Strip, tile and thumbnail payloads

use tracing::{debug, warn};

use crate::compliance::FormatCompliance;
use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::formats::tiff::ifd::{DataElement, ImageData, TiffDirectory};
use crate::formats::tiff::tags;
use crate::io::ByteSource;

/// JPEG end-of-image marker
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Collects the raw strips or tiles of `dir`
///
/// Tiles win when both layouts are declared. Offset and byte count arrays of
/// different lengths are a format error.
pub(crate) fn read_image_data(source: &dyn ByteSource, dir: &TiffDirectory) -> Result<Option<ImageData>> {
    let (offsets_tag, counts_tag, tiled) = if dir.has_field(tags::TILE_OFFSETS) {
        (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS, true)
    } else if dir.has_field(tags::STRIP_OFFSETS) {
        (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS, false)
    } else {
        return Ok(None);
    };

    let offsets = dir.required_ints(offsets_tag)?;
    let byte_counts = dir.required_ints(counts_tag)?;
    if offsets.len() != byte_counts.len() {
        return Err(Error::InvalidFormat(format!(
            "{} directory: {} offsets but {} byte counts",
            dir.kind,
            offsets.len(),
            byte_counts.len()
        )));
    }

    let blocks = offsets
        .iter()
        .zip(&byte_counts)
        .map(|(&offset, &length)| {
            let data = source.block(offset as u64, length as usize)?;
            Ok(DataElement::new(offset as u64, length as u64, data))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("{} directory: {} image blocks", dir.kind, blocks.len());
    Ok(Some(if tiled {
        ImageData::Tiles(blocks)
    } else {
        ImageData::Strips(blocks)
    }))
}

/// Reads the embedded JPEG thumbnail of `dir`, if declared
///
/// A thumbnail running past the end of the source is an error in strict
/// mode and is cut at the end of the source otherwise. An unusable offset or
/// a missing length skips the thumbnail in lenient mode.
pub(crate) fn read_jpeg_thumbnail(
    source: &dyn ByteSource,
    dir: &TiffDirectory,
    strict: bool,
    compliance: &mut FormatCompliance,
) -> Result<Option<DataElement>> {
    let Some(offset_field) = dir.find_field(tags::JPEG_INTERCHANGE_FORMAT) else {
        return Ok(None);
    };
    let location = offset_field
        .int_value()
        .and_then(|offset| Ok((offset, dir.required_int(tags::JPEG_INTERCHANGE_FORMAT_LENGTH)?)));
    let (offset, mut length) = match location {
        Ok((offset, length)) => (offset as u64, length as u64),
        Err(e) if !strict => {
            warn!("{} directory: skipping JPEG thumbnail: {}", dir.kind, e);
            compliance.add_comment(format!("{} directory: JPEG thumbnail skipped: {}", dir.kind, e))?;
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let source_len = source.len()?;
    if offset.saturating_add(length) > source_len {
        if strict {
            return Err(Error::RangeOutOfBounds {
                offset,
                length,
                size: source_len,
            });
        }
        warn!("JPEG thumbnail at {} runs past the end of the source", offset);
        compliance.add_comment_value("JPEG thumbnail truncated at offset", offset as i64)?;
        length = source_len.saturating_sub(offset);
    }

    let data = source.block(offset, length as usize)?;
    if strict && !data.ends_with(&JPEG_EOI) {
        return Err(Error::InvalidFormat(
            "JPEG EOI marker could not be found at expected location".to_string(),
        ));
    }
    Ok(Some(DataElement::new(offset, length, data)))
}

/// Bits of one pixel in one plane
fn bits_per_pixel(dir: &TiffDirectory) -> Result<u64> {
    let bits_per_sample = match dir.find_field(tags::BITS_PER_SAMPLE) {
        Some(field) => field.int_values()?,
        None => vec![1],
    };
    let first = *bits_per_sample
        .first()
        .ok_or_else(|| Error::InvalidFormat("BitsPerSample holds no values".to_string()))? as u64;
    let samples_per_pixel = dir.int_or(tags::SAMPLES_PER_PIXEL, 1)? as u64;

    Ok(if dir.int_or(tags::PLANAR_CONFIGURATION, 1)? == 2 {
        first
    } else if bits_per_sample.len() == 1 {
        first * samples_per_pixel
    } else {
        bits_per_sample.iter().map(|&b| b as u64).sum()
    })
}

/// Row stride in bytes for `width` pixels
fn row_bytes(width: u64, bits_per_pixel: u64) -> Result<u64> {
    width
        .checked_mul(bits_per_pixel)
        .map(|bits| bits.div_ceil(8))
        .ok_or_else(|| Error::InvalidFormat("Row size overflows".to_string()))
}

/// Decompressed size of block `index` derived from the image geometry
pub fn expected_block_length(dir: &TiffDirectory, tiled: bool, index: usize) -> Result<usize> {
    let bits = bits_per_pixel(dir)?;

    let length = if tiled {
        let tile_width = dir.required_int(tags::TILE_WIDTH)? as u64;
        let tile_length = dir.required_int(tags::TILE_LENGTH)? as u64;
        row_bytes(tile_width, bits)?.checked_mul(tile_length)
    } else {
        let width = dir.required_int(tags::IMAGE_WIDTH)? as u64;
        let height = dir.required_int(tags::IMAGE_LENGTH)? as u64;
        let rows_per_strip = (dir.int_or(tags::ROWS_PER_STRIP, u32::MAX)? as u64).min(height);
        if rows_per_strip == 0 {
            return Err(Error::InvalidFormat("RowsPerStrip is 0".to_string()));
        }
        let strips_per_plane = height.div_ceil(rows_per_strip);
        let strip = index as u64 % strips_per_plane;
        let rows = rows_per_strip.min(height - strip * rows_per_strip);
        row_bytes(width, bits)?.checked_mul(rows)
    };

    length
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| Error::InvalidFormat("Block size overflows".to_string()))
}

/// Reverses horizontal differencing on 8-bit samples
fn undo_horizontal_predictor(data: &mut [u8], row_bytes: usize, distance: usize) {
    if row_bytes == 0 {
        return;
    }
    for row in data.chunks_mut(row_bytes) {
        for i in distance..row.len() {
            row[i] = row[i].wrapping_add(row[i - distance]);
        }
    }
}

/// Decompresses strip or tile `index` of a directory read with image data
pub fn decompress_block(dir: &TiffDirectory, index: usize) -> Result<Vec<u8>> {
    let image_data = dir.image_data.as_ref().ok_or_else(|| {
        Error::InvalidFormat(format!("{} directory has no image data loaded", dir.kind))
    })?;
    let block = image_data.blocks().get(index).ok_or_else(|| {
        Error::OutOfBounds(format!(
            "block {} of {} in {} directory",
            index,
            image_data.blocks().len(),
            dir.kind
        ))
    })?;

    let compression = Compression::from_tag(dir.int_or(tags::COMPRESSION, 1)?)?;
    let expected = expected_block_length(dir, image_data.is_tiled(), index)?;
    debug!(
        "Decompressing block {} ({} bytes, {}) to {} bytes",
        index,
        block.data.len(),
        compression.name(),
        expected
    );
    let mut data = compression.decompress(&block.data, expected)?;

    match dir.int_or(tags::PREDICTOR, 1)? {
        1 => {}
        2 => {
            let bits = bits_per_pixel(dir)?;
            let samples = if dir.int_or(tags::PLANAR_CONFIGURATION, 1)? == 2 {
                1
            } else {
                dir.int_or(tags::SAMPLES_PER_PIXEL, 1)? as u64
            };
            if bits != samples * 8 {
                return Err(Error::Unsupported(format!(
                    "Horizontal predictor with {} bits per pixel",
                    bits
                )));
            }
            let width_tag = if image_data.is_tiled() {
                tags::TILE_WIDTH
            } else {
                tags::IMAGE_WIDTH
            };
            let stride = row_bytes(dir.required_int(width_tag)? as u64, bits)? as usize;
            undo_horizontal_predictor(&mut data, stride, samples as usize);
        }
        other => return Err(Error::Unsupported(format!("Predictor {}", other))),
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::packbits;
    use crate::formats::tiff::field_type::FieldType;
    use crate::formats::tiff::ifd::{DirectoryKind, TiffField};
    use crate::io::{ByteOrder, ByteSourceArray};

    const ORDER: ByteOrder = ByteOrder::LittleEndian;

    fn long(tag: u16, value: u32) -> TiffField {
        TiffField::inline(tag, DirectoryKind::ROOT, FieldType::Long, 1, &ORDER.encode_u32(value), ORDER).unwrap()
    }

    fn strip_directory(width: u32, height: u32, rows_per_strip: u32) -> TiffDirectory {
        let mut dir = TiffDirectory::new(DirectoryKind::ROOT, 8, ORDER);
        dir.add_field(long(tags::IMAGE_WIDTH, width));
        dir.add_field(long(tags::IMAGE_LENGTH, height));
        dir.add_field(long(tags::BITS_PER_SAMPLE, 8));
        dir.add_field(long(tags::ROWS_PER_STRIP, rows_per_strip));
        dir
    }

    #[test]
    fn test_apply_horizontal_predictor() {
        let mut data = vec![1, 2, 3, 4, 5, 6];
        undo_horizontal_predictor(&mut data, 3, 1);
        assert_eq!(data, vec![1, 3, 6, 4, 9, 15]);

        let mut rgb = vec![1, 1, 1, 2, 2, 2];
        undo_horizontal_predictor(&mut rgb, 6, 3);
        assert_eq!(rgb, vec![1, 1, 1, 3, 3, 3]);
    }

    #[test]
    fn test_expected_strip_lengths() {
        let dir = strip_directory(10, 5, 2);
        assert_eq!(expected_block_length(&dir, false, 0).unwrap(), 20);
        assert_eq!(expected_block_length(&dir, false, 2).unwrap(), 10);

        let mut bilevel = TiffDirectory::new(DirectoryKind::ROOT, 8, ORDER);
        bilevel.add_field(long(tags::IMAGE_WIDTH, 9));
        bilevel.add_field(long(tags::IMAGE_LENGTH, 2));
        assert_eq!(expected_block_length(&bilevel, false, 0).unwrap(), 4);
    }

    #[test]
    fn test_expected_tile_length() {
        let mut dir = TiffDirectory::new(DirectoryKind::ROOT, 8, ORDER);
        dir.add_field(long(tags::TILE_WIDTH, 16));
        dir.add_field(long(tags::TILE_LENGTH, 16));
        dir.add_field(long(tags::BITS_PER_SAMPLE, 8));
        dir.add_field(long(tags::SAMPLES_PER_PIXEL, 3));
        assert_eq!(expected_block_length(&dir, true, 7).unwrap(), 16 * 16 * 3);
    }

    #[test]
    fn test_read_strips() {
        let mut data = vec![0u8; 32];
        data[20..26].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let source = ByteSourceArray::new(data);

        let mut dir = strip_directory(3, 2, 2);
        dir.add_field(long(tags::STRIP_OFFSETS, 20));
        dir.add_field(long(tags::STRIP_BYTE_COUNTS, 6));

        let image_data = read_image_data(&source, &dir).unwrap().unwrap();
        assert!(!image_data.is_tiled());
        assert_eq!(image_data.blocks()[0].data, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_mismatched_block_arrays() {
        let source = ByteSourceArray::new(vec![0u8; 32]);
        let mut dir = strip_directory(3, 2, 1);
        dir.add_field(
            TiffField::inline(tags::STRIP_OFFSETS, DirectoryKind::ROOT, FieldType::Short, 2, &[20, 0, 23, 0], ORDER)
                .unwrap(),
        );
        dir.add_field(long(tags::STRIP_BYTE_COUNTS, 3));
        assert!(matches!(read_image_data(&source, &dir), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_decompress_packbits_strip() {
        let mut dir = strip_directory(3, 2, 2);
        dir.add_field(long(tags::COMPRESSION, 32773));
        let packed = packbits::compress(&[1, 2, 3, 4, 5, 6]);
        dir.image_data = Some(ImageData::Strips(vec![DataElement::new(100, packed.len() as u64, packed)]));

        assert_eq!(decompress_block(&dir, 0).unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert!(matches!(decompress_block(&dir, 1), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn test_decompress_with_predictor() {
        let mut dir = strip_directory(3, 1, 1);
        dir.add_field(long(tags::PREDICTOR, 2));
        dir.image_data = Some(ImageData::Strips(vec![DataElement::new(100, 3, vec![10, 1, 1])]));
        assert_eq!(decompress_block(&dir, 0).unwrap(), vec![10, 11, 12]);
    }

    #[test]
    fn test_jpeg_thumbnail_clamped_when_lenient() {
        let mut data = vec![0u8; 40];
        data[30] = 0xFF;
        data[31] = 0xD8;
        let source = ByteSourceArray::new(data);
        let mut dir = TiffDirectory::new(DirectoryKind::SUB, 8, ORDER);
        dir.add_field(long(tags::JPEG_INTERCHANGE_FORMAT, 30));
        dir.add_field(long(tags::JPEG_INTERCHANGE_FORMAT_LENGTH, 20));

        let mut compliance = FormatCompliance::lenient();
        let jpeg = read_jpeg_thumbnail(&source, &dir, false, &mut compliance).unwrap().unwrap();
        assert_eq!(jpeg.length, 10);
        assert_eq!(jpeg.data.len(), 10);
        assert_eq!(compliance.comments().len(), 1);

        let mut compliance = FormatCompliance::lenient();
        assert!(read_jpeg_thumbnail(&source, &dir, true, &mut compliance).is_err());
    }

    #[test]
    fn test_jpeg_thumbnail_without_length() {
        let source = ByteSourceArray::new(vec![0u8; 40]);
        let mut dir = TiffDirectory::new(DirectoryKind::SUB, 8, ORDER);
        dir.add_field(long(tags::JPEG_INTERCHANGE_FORMAT, 30));

        let mut compliance = FormatCompliance::lenient();
        assert!(read_jpeg_thumbnail(&source, &dir, false, &mut compliance).unwrap().is_none());
        assert_eq!(compliance.comments().len(), 1);

        let mut compliance = FormatCompliance::lenient();
        assert!(matches!(
            read_jpeg_thumbnail(&source, &dir, true, &mut compliance),
            Err(Error::MissingTag(tags::JPEG_INTERCHANGE_FORMAT_LENGTH))
        ));
    }
}
