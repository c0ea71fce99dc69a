//! Span sources: turning input files into layout-annotated spans.
//!
//! Every input format implements [`SpanSource`]; the [`SourceRegistry`]
//! picks the source for a file from its name suffix.
//!
//! # Example
//!
//! ```no_run
//! use docoutline::source::SourceRegistry;
//! use std::path::Path;
//!
//! fn main() -> docoutline::Result<()> {
//!     let registry = SourceRegistry::with_defaults();
//!     let spans = registry.extract(Path::new("input/report.pdf"))?;
//!     println!("{} spans", spans.len());
//!     Ok(())
//! }
//! ```

mod json;
mod pdf;

pub use json::JsonSpanSource;
pub use pdf::PdfSpanExtractor;

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::Span;

/// A producer of spans for one input format.
pub trait SpanSource: Send + Sync {
    /// Name of this source.
    fn name(&self) -> &str;

    /// File-name suffixes handled by this source, lowercase with the leading
    /// dot (e.g., `[".pdf"]`).
    fn supported_suffixes(&self) -> &[&str];

    /// Extract the spans of a file.
    fn extract(&self, path: &Path) -> Result<Vec<Span>>;

    /// Extract spans from in-memory content.
    fn extract_bytes(&self, bytes: &[u8]) -> Result<Vec<Span>>;

    /// Length of the longest supported suffix matching the file name, if any.
    fn match_len(&self, file_name: &str) -> Option<usize> {
        let lower = file_name.to_lowercase();
        self.supported_suffixes()
            .iter()
            .filter(|suffix| lower.ends_with(*suffix))
            .map(|suffix| suffix.len())
            .max()
    }
}

/// Registry dispatching files to span sources by name suffix.
///
/// Matching is case-insensitive and the longest matching suffix wins, so a
/// specific suffix such as `.spans.json` beats a generic `.json`.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SpanSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the PDF and JSON span sources.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfSpanExtractor::new()));
        registry.register(Arc::new(JsonSpanSource::new()));
        registry
    }

    /// Register a source; later registrations win suffix ties.
    pub fn register(&mut self, source: Arc<dyn SpanSource>) {
        self.sources.insert(0, source);
    }

    /// Find the source for a file.
    pub fn source_for(&self, path: &Path) -> Option<Arc<dyn SpanSource>> {
        let file_name = path.file_name()?.to_str()?;
        let mut best: Option<(usize, &Arc<dyn SpanSource>)> = None;
        for source in &self.sources {
            if let Some(len) = source.match_len(file_name) {
                if best.map_or(true, |(top, _)| len > top) {
                    best = Some((len, source));
                }
            }
        }
        best.map(|(_, source)| source.clone())
    }

    /// Get a source by name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn SpanSource>> {
        self.sources
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Check whether some source handles the file.
    pub fn supports(&self, path: &Path) -> bool {
        self.source_for(path).is_some()
    }

    /// All supported suffixes.
    pub fn supported_suffixes(&self) -> Vec<&str> {
        let mut suffixes: Vec<&str> = self
            .sources
            .iter()
            .flat_map(|s| s.supported_suffixes().iter().copied())
            .collect();
        suffixes.sort_unstable();
        suffixes.dedup();
        suffixes
    }

    /// Extract the spans of a file with the matching source.
    pub fn extract(&self, path: &Path) -> Result<Vec<Span>> {
        let source = self.source_for(path).ok_or_else(|| {
            Error::Extraction(format!("no span source for {}", path.display()))
        })?;
        source.extract(path)
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GenericJson;

    impl SpanSource for GenericJson {
        fn name(&self) -> &str {
            "generic-json"
        }

        fn supported_suffixes(&self) -> &[&str] {
            &[".json"]
        }

        fn extract(&self, _path: &Path) -> Result<Vec<Span>> {
            Ok(Vec::new())
        }

        fn extract_bytes(&self, _bytes: &[u8]) -> Result<Vec<Span>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = SourceRegistry::with_defaults();
        assert!(registry.supports(Path::new("a.pdf")));
        assert!(registry.supports(Path::new("A.PDF")));
        assert!(registry.supports(Path::new("doc.spans.json")));
        assert!(!registry.supports(Path::new("notes.txt")));
        assert!(!registry.supports(Path::new("plain.json")));
        assert_eq!(registry.supported_suffixes(), vec![".pdf", ".spans.json"]);
    }

    #[test]
    fn test_longest_suffix_wins() {
        let mut registry = SourceRegistry::with_defaults();
        registry.register(Arc::new(GenericJson));

        let spans = registry.source_for(Path::new("doc.spans.json")).unwrap();
        assert_eq!(spans.name(), "spans-json");
        let generic = registry.source_for(Path::new("other.json")).unwrap();
        assert_eq!(generic.name(), "generic-json");
    }

    #[test]
    fn test_get_by_name() {
        let registry = SourceRegistry::with_defaults();
        assert!(registry.get_by_name("PDF").is_some());
        assert!(registry.get_by_name("docx").is_none());
    }

    #[test]
    fn test_extract_unsupported_file() {
        let registry = SourceRegistry::with_defaults();
        let err = registry.extract(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
