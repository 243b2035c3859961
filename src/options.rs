//! Read options for the directory reader

use serde::Serialize;

/// Options recognised by [`crate::formats::tiff::TiffReader`]
///
/// The default is lenient and skips thumbnail payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReadOptions {
    /// Fail on the first structural deviation instead of recovering
    pub strict: bool,
    /// Fetch strip, tile and JPEG thumbnail byte ranges
    pub read_thumbnails: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict options: every deviation is an error.
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_thumbnails(mut self, read_thumbnails: bool) -> Self {
        self.read_thumbnails = read_thumbnails;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ReadOptions::default();
        assert!(!options.strict);
        assert!(!options.read_thumbnails);
        assert_eq!(ReadOptions::new(), options);
    }

    #[test]
    fn test_builders() {
        let options = ReadOptions::strict().with_thumbnails(true);
        assert!(options.strict);
        assert!(options.read_thumbnails);
        assert!(!options.with_strict(false).strict);
    }
}
