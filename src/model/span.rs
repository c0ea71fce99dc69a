//! Span-level types produced by span sources.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Axis-aligned bounding box in page coordinates (top-down, points).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BoundingBox {
    /// Create a bounding box, normalizing so that `x0 <= x1` and `y0 <= y1`.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Horizontal center of the box.
    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// An atomic positioned text run with font metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Page number (1-indexed)
    pub page: u32,

    /// The text content
    pub text: String,

    /// Font size in points
    pub size: f32,

    /// Whether the run is set in a bold face
    #[serde(default)]
    pub bold: bool,

    /// Position on the page
    #[serde(default)]
    pub bbox: BoundingBox,

    /// Line index within the page, increasing in reading order
    pub line_no: u32,
}

impl Span {
    /// Create a regular-weight span with an empty bounding box.
    pub fn new(page: u32, line_no: u32, text: impl Into<String>, size: f32) -> Self {
        Self {
            page,
            text: text.into(),
            size,
            bold: false,
            bbox: BoundingBox::default(),
            line_no,
        }
    }

    /// Mark the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Set the bounding box.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    /// Check the record against the span interface contract.
    pub fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(Error::Extraction(format!(
                "span {:?} has page 0 (pages are 1-indexed)",
                self.text
            )));
        }
        if self.text.trim().is_empty() {
            return Err(Error::Extraction(format!(
                "span on page {} line {} has empty text",
                self.page, self.line_no
            )));
        }
        if !(self.size.is_finite() && self.size > 0.0) {
            return Err(Error::Extraction(format!(
                "span {:?} has non-positive font size {}",
                self.text, self.size
            )));
        }
        Ok(())
    }
}
