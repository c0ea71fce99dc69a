//! Line assembly: merging spans that share a page and line index.

use crate::model::{BoundingBox, Span};

/// Spans sharing `(page, line_no)`, merged into one text unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Page number (1-indexed)
    pub page: u32,
    /// Line index within the page
    pub line_no: u32,
    /// Span texts joined with single spaces, trimmed
    pub text: String,
    /// Largest span font size in the line
    pub size: f32,
    /// Boldness of the size-dominant span
    pub bold: bool,
    /// Union of the span boxes
    pub bbox: BoundingBox,
}

impl Line {
    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Number of characters in the merged text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Group spans into lines ordered by page, then line index.
///
/// Spans keep their original order inside a line and lines with the same key
/// never depend on text content, so the result is reproducible for a fixed
/// span list. Lines whose merged text is blank are dropped.
pub fn assemble_lines(spans: &[Span]) -> Vec<Line> {
    let mut order: Vec<usize> = (0..spans.len()).collect();
    // Stable: spans of one line stay in extraction order.
    order.sort_by_key(|&i| (spans[i].page, spans[i].line_no));

    let mut lines = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let key = (spans[order[start]].page, spans[order[start]].line_no);
        let mut end = start + 1;
        while end < order.len() && (spans[order[end]].page, spans[order[end]].line_no) == key {
            end += 1;
        }

        let group: Vec<&Span> = order[start..end].iter().map(|&i| &spans[i]).collect();
        if let Some(line) = merge_group(&group) {
            lines.push(line);
        }
        start = end;
    }

    lines
}

fn merge_group(group: &[&Span]) -> Option<Line> {
    let first = group.first()?;

    let text = group
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();
    if text.is_empty() {
        return None;
    }

    // First span wins ties for the dominant size.
    let mut dominant = *first;
    for span in &group[1..] {
        if span.size > dominant.size {
            dominant = span;
        }
    }

    let bbox = group[1..]
        .iter()
        .fold(first.bbox, |acc, s| acc.union(&s.bbox));

    Some(Line {
        page: first.page,
        line_no: first.line_no,
        text,
        size: dominant.size,
        bold: dominant.bold,
        bbox,
    })
}
