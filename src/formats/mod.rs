//! Container formats

pub mod tiff;
