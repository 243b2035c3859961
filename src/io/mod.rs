//! I/O utilities for tiffscope
//!
//! Byte-order aware primitive decoding, raw byte helpers and the byte source
//! abstraction the directory reader pulls container bytes through.

pub mod traits;
pub mod byte_order;
pub mod buffer;
pub mod bytes;
pub mod source;

pub use traits::{ByteSource, SeekableReader};
pub use byte_order::{ByteOrder, ByteOrderHandler};
pub use buffer::BufferedReader;
pub use bytes::ReadMode;
pub use source::{ByteSourceArray, ByteSourceFile, ByteSourceReader};
