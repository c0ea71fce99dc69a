//! Outline and section types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Heading level of an outline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HeadingLevel {
    /// Top-level heading
    H1,
    /// Second-level heading
    H2,
    /// Third-level heading
    H3,
}

impl HeadingLevel {
    /// Label used in JSON output ("H1", "H2", "H3").
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level
    pub level: HeadingLevel,
    /// Heading text
    pub text: String,
    /// Page the heading appears on (1-indexed)
    pub page: u32,
}

impl OutlineEntry {
    /// Create a new outline entry.
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: u32) -> Self {
        Self {
            level,
            text: text.into(),
            page,
        }
    }
}

/// Title and heading outline of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutline {
    /// Inferred document title (may be empty)
    pub title: String,
    /// Headings ordered by page, then line order within the page
    pub outline: Vec<OutlineEntry>,
}

impl DocumentOutline {
    /// The outline of a document without usable text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether no heading was detected.
    pub fn is_empty(&self) -> bool {
        self.outline.is_empty()
    }
}

/// A contiguous page-range slice of a document anchored at a heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Anchor heading text ("Document" for a whole-document section)
    pub title: String,
    /// Anchor heading level
    pub level: HeadingLevel,
    /// First page of the section
    pub page_start: u32,
    /// Text of all spans in the section
    pub text: String,
}
