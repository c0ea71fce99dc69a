//! Outline construction for one document.

use log::debug;

use super::baseline::body_size;
use super::classifier::{HeadingClassifier, HeadingConfig};
use super::form::{select_form_title, FormConfig, FormDetector};
use super::lines::assemble_lines;
use super::title::select_title;
use crate::model::{DocumentOutline, OutlineEntry, Span};

/// Builds a [`DocumentOutline`] from a document's spans.
///
/// # Example
///
/// ```
/// use docoutline::analysis::OutlineBuilder;
/// use docoutline::Span;
///
/// let spans = vec![
///     Span::new(1, 1, "Annual Report 2024", 20.0).bold(),
///     Span::new(1, 2, "1. Introduction", 12.0).bold(),
///     Span::new(1, 3, "This report covers the year in review.", 10.0),
/// ];
/// let outline = OutlineBuilder::new().build(&spans);
/// assert_eq!(outline.title, "Annual Report 2024");
/// ```
#[derive(Debug, Clone)]
pub struct OutlineBuilder {
    classifier: HeadingClassifier,
    form_detector: FormDetector,
    detect_forms: bool,
}

impl OutlineBuilder {
    /// Create a builder with default heading and form settings.
    pub fn new() -> Self {
        Self {
            classifier: HeadingClassifier::default(),
            form_detector: FormDetector::default(),
            detect_forms: true,
        }
    }

    /// Set the heading configuration.
    pub fn with_heading_config(mut self, config: HeadingConfig) -> Self {
        self.classifier = HeadingClassifier::new(config);
        self
    }

    /// Set the form gate configuration.
    pub fn with_form_config(mut self, config: FormConfig) -> Self {
        self.form_detector = FormDetector::new(config);
        self
    }

    /// Enable or disable the form gate.
    pub fn with_form_detection(mut self, enabled: bool) -> Self {
        self.detect_forms = enabled;
        self
    }

    /// Disable the form gate; every document gets heading extraction.
    pub fn without_form_detection(self) -> Self {
        self.with_form_detection(false)
    }

    /// The heading classifier in use.
    pub fn classifier(&self) -> &HeadingClassifier {
        &self.classifier
    }

    /// Build the outline.
    ///
    /// Zero spans give an empty title and outline. Forms get a title and no
    /// headings. Otherwise every line is classified in (page, line) order and
    /// accepted candidates are appended, so entries keep document order.
    pub fn build(&self, spans: &[Span]) -> DocumentOutline {
        if spans.is_empty() {
            return DocumentOutline::empty();
        }

        let lines = assemble_lines(spans);

        if self.detect_forms {
            let verdict = self.form_detector.evaluate(&lines);
            debug!(
                "form gate: indicators={}, short={:.2}, numbered={:.2}, keywords={:.2}, form={}",
                verdict.indicator_matches,
                verdict.short_ratio,
                verdict.numbered_ratio,
                verdict.keyword_ratio,
                verdict.is_form
            );
            if verdict.is_form {
                return DocumentOutline {
                    title: select_form_title(&lines),
                    outline: Vec::new(),
                };
            }
        }

        let body = body_size(spans);
        let title = select_title(&lines);
        debug!("body size {:.1}, title {:?}", body, title);

        let mut outline = Vec::new();
        for line in lines {
            let candidate = self.classifier.candidate(line, body);
            let Some(level) = candidate.level else {
                continue;
            };
            if self.classifier.accepts(&candidate) {
                debug!(
                    "heading p{} l{} {} score={:.2}: {}",
                    candidate.line.page,
                    candidate.line.line_no,
                    level,
                    candidate.score,
                    candidate.line.text
                );
                outline.push(OutlineEntry::new(
                    level,
                    candidate.line.text,
                    candidate.line.page,
                ));
            }
        }

        DocumentOutline { title, outline }
    }
}

impl Default for OutlineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
