//! Data model shared by the analysis and ranking pipelines.
//!
//! Spans come from a span source, outlines and sections are derived per
//! document, and reports are produced per query.

mod outline;
mod query;
mod report;
mod span;

pub use outline::{DocumentOutline, HeadingLevel, OutlineEntry, Section};
pub use query::{load_queries, parse_queries, Query, DEFAULT_TOP_K};
pub use report::{RankedResult, RefinedSubsection, RelevanceReport, ReportMetadata};
pub use span::{BoundingBox, Span};
