//! tiffscope - TIFF and EXIF container inspection for Rust
//!
//! tiffscope walks the directory graph of TIFF containers (including the
//! EXIF, GPS and Interoperability sub-directories embedded in camera files),
//! decodes field values against typed tag tables and locates the compressed
//! strips, tiles and JPEG thumbnails without decoding pixels.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use tiffscope::{ByteSourceFile, ReadOptions, TiffReader};
//!
//! let source = ByteSourceFile::open("photo.tif")?;
//! let mut reader = TiffReader::new(&source, ReadOptions::default());
//! let contents = reader.read_contents()?;
//!
//! for dir in &contents.directories {
//!     println!("{}", dir);
//! }
//! println!("{}", reader.compliance());
//! # Ok::<(), tiffscope::Error>(())
//! ```
//!
//! ## GPS Position
//!
//! ```no_run
//! use tiffscope::{ByteSourceFile, ReadOptions, TiffReader};
//!
//! let source = ByteSourceFile::open("photo.tif")?;
//! let contents = TiffReader::new(&source, ReadOptions::default()).read_contents()?;
//!
//! if let Some(gps) = contents.gps()? {
//!     println!("{:.6}, {:.6}", gps.latitude_degrees(), gps.longitude_degrees());
//! }
//! # Ok::<(), tiffscope::Error>(())
//! ```
//!
//! ## Decompressing Strips
//!
//! ```no_run
//! use tiffscope::{decompress_block, ByteSourceFile, ReadOptions, TiffReader};
//!
//! let source = ByteSourceFile::open("image.tif")?;
//! let options = ReadOptions::default().with_thumbnails(true);
//! let contents = TiffReader::new(&source, options).read_contents()?;
//!
//! if let Some(root) = contents.root() {
//!     let strip = decompress_block(root, 0)?;
//!     println!("First strip: {} bytes", strip.len());
//! }
//! # Ok::<(), tiffscope::Error>(())
//! ```

pub mod compliance;
pub mod compression;
pub mod error;
pub mod formats;
pub mod io;
pub mod options;
pub mod types;

pub use compliance::FormatCompliance;
pub use compression::Compression;
pub use error::{Error, ErrorKind, Result};
pub use formats::tiff::{
    decompress_block, tags, Collector, DirectoryKind, FieldType, FieldValue, FirstDirectoryCollector, Flow,
    GpsInfo, Listener, MetadataCollector, ReadOutcome, TagInfo, TiffContents, TiffDirectory, TiffField,
    TiffHeader, TiffReader,
};
pub use io::{ByteOrder, ByteSource, ByteSourceArray, ByteSourceFile, ByteSourceReader, ReadMode};
pub use options::ReadOptions;
pub use types::RationalNumber;
