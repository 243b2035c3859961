//! Format compliance collector
//!
//! Records deviations from the TIFF layout that do not stop a parse. A
//! lenient collector only accumulates comments; a strict one turns the first
//! comment into [`Error::Compliance`].

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Append-only log of deviation comments for one parse pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatCompliance {
    description: String,
    strict: bool,
    comments: Vec<String>,
}

impl FormatCompliance {
    pub fn new(description: impl Into<String>, strict: bool) -> Self {
        Self {
            description: description.into(),
            strict,
            comments: Vec::new(),
        }
    }

    /// Lenient collector with an empty description
    pub fn lenient() -> Self {
        Self::new("", false)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Records a comment, or fails straight away in strict mode
    pub fn add_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        let comment = comment.into();
        if self.strict {
            return Err(Error::Compliance(comment));
        }
        debug!(comment = %comment, "format compliance");
        self.comments.push(comment);
        Ok(())
    }

    /// Records a comment in either mode
    ///
    /// For conditions the reader reports as an outcome rather than a fault,
    /// such as a directory offset past the end of the source.
    pub fn note(&mut self, comment: impl Into<String>) {
        let comment = comment.into();
        debug!(comment = %comment, "format compliance");
        self.comments.push(comment);
    }

    pub fn add_comment_value(&mut self, comment: &str, value: i64) -> Result<()> {
        self.add_comment(format!("{}: {}", comment, describe(value)))
    }

    /// Compares two byte sequences, recording a length or content mismatch
    pub fn compare_bytes(&mut self, name: &str, expected: &[u8], actual: &[u8]) -> Result<bool> {
        if expected.len() != actual.len() {
            self.add_comment(format!(
                "{}: Unexpected length: (expected: {}, actual: {})",
                name,
                expected.len(),
                actual.len()
            ))?;
            return Ok(false);
        }
        if let Some(i) = expected.iter().zip(actual).position(|(a, b)| a != b) {
            self.add_comment(format!(
                "{}: Unexpected value: (expected: {}, actual: {})",
                name,
                describe(expected[i] as i64),
                describe(actual[i] as i64)
            ))?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Checks that `actual` is one of the `valid` values
    pub fn compare(&mut self, name: &str, valid: &[i64], actual: i64) -> Result<bool> {
        if valid.contains(&actual) {
            return Ok(true);
        }
        let listed: Vec<String> = valid.iter().map(|&v| describe(v)).collect();
        let valid_text = if listed.len() == 1 {
            listed.concat()
        } else {
            format!("{{{}}}", listed.join(", "))
        };
        self.add_comment(format!(
            "{}: Unexpected value: (valid: {}, actual: {})",
            name,
            valid_text,
            describe(actual)
        ))?;
        Ok(false)
    }

    /// Checks `min <= actual <= max`
    pub fn check_bounds(&mut self, name: &str, min: i64, max: i64, actual: i64) -> Result<bool> {
        if (min..=max).contains(&actual) {
            return Ok(true);
        }
        self.add_comment(format!(
            "{}: bounds check: {} <= {} <= {}: false",
            name, min, actual, max
        ))?;
        Ok(false)
    }
}

fn describe(value: i64) -> String {
    format!("{} ({:#x})", value, value)
}

impl fmt::Display for FormatCompliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Format Compliance: {}", self.description)?;
        if self.comments.is_empty() {
            return writeln!(f, "\tNo comments.");
        }
        for (i, comment) in self.comments.iter().enumerate() {
            writeln!(f, "\t{}: {}", i + 1, comment)?;
        }
        Ok(())
    }
}
