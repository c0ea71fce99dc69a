//! Span extraction from PDF pages.

use std::path::Path;

use log::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::content::{is_bold_font, read_page_runs, TextRun};
use super::options::{ErrorMode, ExtractOptions};
use crate::detect::{detect_pdf_bytes, detect_pdf_path};
use crate::error::{Error, Result};
use crate::model::{BoundingBox, Span};

/// Ascender height as a fraction of font size.
const ASCENT: f32 = 0.8;
/// Descender depth as a fraction of font size.
const DESCENT: f32 = 0.2;

/// Reads layout-annotated spans from a PDF document.
///
/// # Example
///
/// ```no_run
/// use docoutline::parser::{ExtractOptions, PdfSpanReader};
///
/// let reader = PdfSpanReader::open("report.pdf", ExtractOptions::default())?;
/// for span in reader.read_spans()? {
///     println!("p{} l{} {:.1}pt {}", span.page, span.line_no, span.size, span.text);
/// }
/// # Ok::<(), docoutline::Error>(())
/// ```
pub struct PdfSpanReader<B: PdfBackend = LopdfBackend> {
    backend: B,
    options: ExtractOptions,
}

impl PdfSpanReader<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Self> {
        let path = path.as_ref();
        detect_pdf_path(path)?;
        Ok(Self::with_backend(LopdfBackend::load_file(path)?, options))
    }

    /// Read a PDF from bytes.
    pub fn from_bytes(data: &[u8], options: ExtractOptions) -> Result<Self> {
        detect_pdf_bytes(data)?;
        Ok(Self::with_backend(LopdfBackend::load_bytes(data)?, options))
    }
}

impl<B: PdfBackend> PdfSpanReader<B> {
    /// Wrap an existing backend.
    pub fn with_backend(backend: B, options: ExtractOptions) -> Self {
        Self { backend, options }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.backend.page_map().len() as u32
    }

    /// Read the spans of every selected page, in page order.
    ///
    /// In lenient mode a page that fails to decode is logged and skipped.
    pub fn read_spans(&self) -> Result<Vec<Span>> {
        let pages = self.backend.page_map();
        let count = pages.len() as u32;
        if let Some(last) = self.options.pages.last_page().filter(|&p| p > count) {
            match self.options.error_mode {
                ErrorMode::Strict => return Err(Error::PageOutOfRange(last, count)),
                ErrorMode::Lenient => warn!("page {} requested, document has {}", last, count),
            }
        }

        let mut spans = Vec::new();
        for (page_num, page_id) in pages {
            if !self.options.pages.includes(page_num) {
                continue;
            }
            match self.read_page(page_num, page_id) {
                Ok(page_spans) => spans.extend(page_spans),
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    warn!("skipping page {}: {}", page_num, e);
                }
                Err(e) => return Err(e),
            }
        }
        debug!("extracted {} spans", spans.len());
        Ok(spans)
    }

    fn read_page(&self, page_num: u32, page_id: PageId) -> Result<Vec<Span>> {
        let runs = read_page_runs(&self.backend, page_id)?;
        let height = self.backend.page_height(page_id);
        Ok(runs_to_spans(page_num, runs, height, &self.options))
    }
}

/// Turn a page's text runs into spans with reading-order line indices.
///
/// Runs are ordered top to bottom, then left to right. A run joins the current
/// line when its baseline is within `line_tolerance × size` of the line's
/// first baseline. Line indices start at 1 on every page. Boxes are flipped to
/// top-down coordinates using the page height.
pub fn runs_to_spans(
    page: u32,
    mut runs: Vec<TextRun>,
    page_height: f32,
    options: &ExtractOptions,
) -> Vec<Span> {
    runs.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Vec<TextRun>> = Vec::new();
    let mut line_y: Option<f32> = None;
    for run in runs {
        let text = if options.normalize {
            run.text.nfkc().collect::<String>()
        } else {
            run.text.clone()
        };
        let text = text.trim().to_string();
        if text.is_empty() || !(run.size.is_finite() && run.size > 0.0) {
            continue;
        }
        let run = TextRun { text, ..run };

        let joins = line_y.is_some_and(|y| (run.y - y).abs() <= run.size * options.line_tolerance);
        match lines.last_mut() {
            Some(line) if joins => line.push(run),
            _ => {
                line_y = Some(run.y);
                lines.push(vec![run]);
            }
        }
    }

    let mut spans = Vec::new();
    for (idx, mut line) in lines.into_iter().enumerate() {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
        for run in line {
            let bbox = BoundingBox::new(
                run.x,
                page_height - (run.y + run.size * ASCENT),
                run.x + run.width,
                page_height - (run.y - run.size * DESCENT),
            );
            spans.push(Span {
                page,
                bold: is_bold_font(&run.font),
                text: run.text,
                size: run.size,
                bbox,
                line_no: idx as u32 + 1,
            });
        }
    }

    spans
}
