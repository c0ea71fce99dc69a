//! # docoutline
//!
//! Heading outline inference and persona-driven section ranking for PDF
//! documents.
//!
//! The library reads layout-annotated text spans from a document, infers its
//! title and H1/H2/H3 heading outline, cuts it into heading-anchored
//! sections, and ranks those sections against a persona/task query.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docoutline::{outline_file, render, JsonFormat};
//!
//! fn main() -> docoutline::Result<()> {
//!     let outline = outline_file("document.pdf")?;
//!     println!("{}", render::to_json(&outline, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Outline inference**: rule-based heading scoring with a tunable weight table
//! - **Form gate**: fillable forms get a title but no outline
//! - **Relevance ranking**: embedding similarity plus query-biased extracts
//! - **Embedders**: MiniLM on candle (`model` feature, default) or offline feature hashing
//! - **Span sources**: PDF via lopdf, or pre-extracted `*.spans.json` files
//! - **Parallel processing**: documents are processed with Rayon

pub mod analysis;
pub mod collection;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod rank;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use analysis::{HeadingConfig, OutlineBuilder};
pub use collection::{OutlinePipeline, RelevancePipeline};
pub use detect::{detect_pdf_bytes, detect_pdf_path, is_pdf_bytes, PdfHeader};
pub use error::{Error, Result};
pub use model::{
    BoundingBox, DocumentOutline, HeadingLevel, OutlineEntry, Query, RankedResult,
    RefinedSubsection, RelevanceReport, Section, Span,
};
pub use parser::{ErrorMode, ExtractOptions, PageSelection};
#[cfg(feature = "model")]
pub use rank::MiniLmEmbedder;
pub use rank::{Embedder, HashingEmbedder, RankOptions};
pub use render::JsonFormat;
pub use source::{SourceRegistry, SpanSource};

use std::path::Path;

use source::PdfSpanExtractor;

/// Extract the spans of a document file.
///
/// The span source is chosen from the file name (`.pdf` or `.spans.json`).
///
/// # Example
///
/// ```no_run
/// use docoutline::extract_spans;
///
/// let spans = extract_spans("document.pdf").unwrap();
/// println!("{} spans", spans.len());
/// ```
pub fn extract_spans<P: AsRef<Path>>(path: P) -> Result<Vec<Span>> {
    SourceRegistry::with_defaults().extract(path.as_ref())
}

/// Extract the spans of a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use docoutline::{extract_spans_with_options, ExtractOptions, PageSelection};
///
/// let options = ExtractOptions::new()
///     .lenient()
///     .with_pages(PageSelection::Range(1..=2));
/// let spans = extract_spans_with_options("document.pdf", options).unwrap();
/// ```
pub fn extract_spans_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<Vec<Span>> {
    PdfSpanExtractor::with_options(options).extract(path.as_ref())
}

/// Infer the outline of a span list with default settings.
pub fn outline_spans(spans: &[Span]) -> DocumentOutline {
    OutlineBuilder::new().build(spans)
}

/// Infer the outline of a document file.
///
/// # Example
///
/// ```no_run
/// use docoutline::outline_file;
///
/// let outline = outline_file("document.pdf").unwrap();
/// for entry in &outline.outline {
///     println!("{} {} (p{})", entry.level.as_str(), entry.text, entry.page);
/// }
/// ```
pub fn outline_file<P: AsRef<Path>>(path: P) -> Result<DocumentOutline> {
    let spans = extract_spans(path)?;
    Ok(outline_spans(&spans))
}

/// Infer the outline of an in-memory PDF.
pub fn outline_bytes(data: &[u8]) -> Result<DocumentOutline> {
    let spans = PdfSpanExtractor::new().extract_bytes(data)?;
    Ok(outline_spans(&spans))
}

/// Infer the outline of a document file and render it as JSON.
///
/// # Example
///
/// ```no_run
/// use docoutline::{outline_json, JsonFormat};
///
/// let json = outline_json("document.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("document.json", json).unwrap();
/// ```
pub fn outline_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let outline = outline_file(path)?;
    render::to_json(&outline, format)
}

/// Builder for outlining documents with custom settings.
///
/// # Example
///
/// ```no_run
/// use docoutline::{Outliner, PageSelection};
///
/// let outline = Outliner::new()
///     .lenient()
///     .with_pages(PageSelection::Range(1..=10))
///     .without_form_detection()
///     .outline("document.pdf")?;
/// # Ok::<(), docoutline::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Outliner {
    extract_options: ExtractOptions,
    builder: OutlineBuilder,
}

impl Outliner {
    /// Create a new outliner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip PDF pages that fail to decode.
    pub fn lenient(mut self) -> Self {
        self.extract_options = self.extract_options.lenient();
        self
    }

    /// Restrict PDF extraction to some pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.extract_options = self.extract_options.with_pages(pages);
        self
    }

    /// Set the heading configuration.
    pub fn with_heading_config(mut self, config: HeadingConfig) -> Self {
        self.builder = self.builder.with_heading_config(config);
        self
    }

    /// Disable the form gate.
    pub fn without_form_detection(mut self) -> Self {
        self.builder = self.builder.without_form_detection();
        self
    }

    /// The span registry used for files: PDF with these options, plus JSON spans.
    pub fn registry(&self) -> SourceRegistry {
        let mut registry = SourceRegistry::with_defaults();
        registry.register(std::sync::Arc::new(PdfSpanExtractor::with_options(
            self.extract_options.clone(),
        )));
        registry
    }

    /// Outline a document file.
    pub fn outline<P: AsRef<Path>>(&self, path: P) -> Result<DocumentOutline> {
        let spans = self.registry().extract(path.as_ref())?;
        Ok(self.builder.build(&spans))
    }

    /// Outline an in-memory PDF.
    pub fn outline_bytes(&self, data: &[u8]) -> Result<DocumentOutline> {
        let spans =
            PdfSpanExtractor::with_options(self.extract_options.clone()).extract_bytes(data)?;
        Ok(self.builder.build(&spans))
    }

    /// A batch pipeline sharing these settings.
    pub fn pipeline(&self) -> OutlinePipeline {
        OutlinePipeline::new()
            .with_registry(self.registry())
            .with_builder(self.builder.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_spans() -> Vec<Span> {
        vec![
            Span::new(1, 1, "Quarterly Operations Review", 22.0).bold(),
            Span::new(1, 2, "Prepared for the board of directors.", 10.0),
            Span::new(2, 1, "1. Revenue Overview", 14.0).bold(),
            Span::new(2, 2, "Revenue grew in every region this quarter.", 10.0),
            Span::new(3, 1, "2. Staffing Changes", 14.0).bold(),
            Span::new(3, 2, "Two new teams were formed in support.", 10.0),
        ]
    }

    #[test]
    fn test_outline_spans() {
        let outline = outline_spans(&report_spans());
        assert_eq!(outline.title, "Quarterly Operations Review");
        let texts: Vec<_> = outline.outline.iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"1. Revenue Overview"));
        assert!(texts.contains(&"2. Staffing Changes"));
    }

    #[test]
    fn test_outline_file_from_span_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.spans.json");
        std::fs::write(&path, serde_json::to_string(&report_spans()).unwrap()).unwrap();

        let from_file = outline_file(&path).unwrap();
        assert_eq!(from_file, outline_spans(&report_spans()));

        let json = outline_json(&path, JsonFormat::Compact).unwrap();
        assert!(json.starts_with(r#"{"title":"Quarterly Operations Review""#));
    }

    #[test]
    fn test_outline_bytes_rejects_non_pdf() {
        assert!(matches!(outline_bytes(b"not a pdf"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_outliner_without_forms() {
        let outliner = Outliner::new().without_form_detection();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.spans.json");
        std::fs::write(&path, serde_json::to_string(&report_spans()).unwrap()).unwrap();

        let outline = outliner.outline(&path).unwrap();
        assert_eq!(outline.title, "Quarterly Operations Review");
        assert!(outliner.pipeline().registry().supports(&path));
    }
}
