//! Heading-anchored section segmentation.

use crate::model::{DocumentOutline, HeadingLevel, Section, Span};

/// Title of the single section produced for documents without headings.
pub const WHOLE_DOCUMENT_TITLE: &str = "Document";

/// Cut a document's spans into sections at the outline's heading anchors.
///
/// Each anchor owns the pages from its own page up to, but excluding, the next
/// anchor's page; the last anchor runs to the end of the document. Pages
/// before the first anchor are front matter and belong to no section. Two
/// anchors on the same page give the first an empty text.
///
/// Without anchors the whole document becomes one H1 section titled
/// "Document" whose text joins every span with newlines.
pub fn segment_sections(spans: &[Span], outline: &DocumentOutline) -> Vec<Section> {
    if outline.outline.is_empty() {
        let text = spans
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        return vec![Section {
            title: WHOLE_DOCUMENT_TITLE.to_string(),
            level: HeadingLevel::H1,
            page_start: 1,
            text,
        }];
    }

    let mut anchors: Vec<_> = outline.outline.iter().collect();
    // Stable: anchors sharing a page keep outline order.
    anchors.sort_by_key(|a| a.page);

    anchors
        .iter()
        .enumerate()
        .map(|(i, anchor)| {
            let end = anchors.get(i + 1).map(|next| next.page);
            let text = spans
                .iter()
                .filter(|s| s.page >= anchor.page && end.map_or(true, |end| s.page < end))
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            Section {
                title: anchor.text.clone(),
                level: anchor.level,
                page_start: anchor.page,
                text,
            }
        })
        .collect()
}
