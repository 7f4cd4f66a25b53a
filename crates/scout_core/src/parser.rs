//! Boundary to the external replay parser.
//!
//! The binary recording format is decoded elsewhere; this crate consumes the
//! JSON document that decoder produces.

use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::replay::RawMatch;

/// Produces a [`RawMatch`] from replay input.
pub trait ReplayParser {
    /// Parse a replay held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ReplayParse`] if the input is not a replay
    /// document.
    fn parse_bytes(&self, bytes: &[u8], source_name: &str) -> Result<RawMatch>;

    /// Read and parse a replay file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the file cannot be read, or
    /// [`AnalysisError::ReplayParse`] if it is not a replay document.
    fn parse_file(&self, path: &Path) -> Result<RawMatch> {
        let bytes = std::fs::read(path).map_err(|e| AnalysisError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.parse_bytes(&bytes, &path.display().to_string())
    }
}

/// Reads the serialized JSON form of a replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReplayParser;

impl JsonReplayParser {
    /// Create a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse a replay from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::ReplayParse`] if the text is not a replay
    /// document.
    pub fn parse_str(&self, text: &str, source_name: &str) -> Result<RawMatch> {
        self.parse_bytes(text.as_bytes(), source_name)
    }
}

impl ReplayParser for JsonReplayParser {
    fn parse_bytes(&self, bytes: &[u8], source_name: &str) -> Result<RawMatch> {
        serde_json::from_slice(bytes).map_err(|e| AnalysisError::ReplayParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }
}
