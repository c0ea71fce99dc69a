//! PDF span source.

use std::path::Path;

use log::debug;

use super::SpanSource;
use crate::error::Result;
use crate::model::Span;
use crate::parser::{ExtractOptions, PdfSpanReader};

/// Extracts spans from PDF files through the lopdf backend.
#[derive(Debug, Clone, Default)]
pub struct PdfSpanExtractor {
    options: ExtractOptions,
}

impl PdfSpanExtractor {
    /// Create an extractor with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom options.
    pub fn with_options(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// The active options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }
}

impl SpanSource for PdfSpanExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supported_suffixes(&self) -> &[&str] {
        &[".pdf"]
    }

    fn extract(&self, path: &Path) -> Result<Vec<Span>> {
        debug!("reading spans from {}", path.display());
        PdfSpanReader::open(path, self.options.clone())?.read_spans()
    }

    fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<Span>> {
        PdfSpanReader::from_bytes(bytes, self.options.clone())?.read_spans()
    }
}
