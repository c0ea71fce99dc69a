//! JSON span files.
//!
//! A `*.spans.json` file holds a JSON array of span records:
//!
//! ```json
//! [
//!   {"page": 1, "text": "Annual Report", "size": 20.0, "bold": true,
//!    "bbox": {"x0": 72.0, "y0": 60.0, "x1": 300.0, "y1": 84.0}, "line_no": 1}
//! ]
//! ```
//!
//! `bold` and `bbox` are optional.

use std::fs;
use std::path::Path;

use super::SpanSource;
use crate::error::{Error, Result};
use crate::model::Span;

/// Reads pre-extracted spans from JSON files.
#[derive(Debug, Clone, Default)]
pub struct JsonSpanSource {
    _private: (),
}

impl JsonSpanSource {
    /// Create a new JSON span source.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Parse and validate a JSON span array.
    pub fn parse(&self, json: &str) -> Result<Vec<Span>> {
        let spans: Vec<Span> = serde_json::from_str(json)
            .map_err(|e| Error::Extraction(format!("invalid span file: {}", e)))?;
        for (idx, span) in spans.iter().enumerate() {
            span.validate()
                .map_err(|e| Error::Extraction(format!("span {}: {}", idx, e)))?;
        }
        Ok(spans)
    }
}

impl SpanSource for JsonSpanSource {
    fn name(&self) -> &str {
        "spans-json"
    }

    fn supported_suffixes(&self) -> &[&str] {
        &[".spans.json"]
    }

    fn extract(&self, path: &Path) -> Result<Vec<Span>> {
        let json = fs::read_to_string(path)?;
        self.parse(&json)
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<Span>> {
        let json = std::str::from_utf8(bytes)
            .map_err(|e| Error::Extraction(format!("span file is not UTF-8: {}", e)))?;
        self.parse(json)
    }
}
