//! Document-structure inference.
//!
//! Spans are merged into lines, measured against the document's body size and
//! classified into headings. The outline builder ties the steps together and
//! the segmenter cuts the document into heading-anchored sections.

mod baseline;
mod classifier;
mod form;
mod lines;
mod outline;
mod sections;
mod title;

pub use baseline::{body_size, DEFAULT_BODY_SIZE};
pub use classifier::{
    uppercase_ratio, Classification, HeadingCandidate, HeadingClassifier, HeadingConfig,
    HeadingWeights, LevelRule, LevelThresholds, SizeGate, Signals,
};
pub use form::{select_form_title, FormConfig, FormDetector, FormVerdict};
pub use lines::{assemble_lines, Line};
pub use outline::OutlineBuilder;
pub use sections::{segment_sections, WHOLE_DOCUMENT_TITLE};
pub use title::{is_title_like, select_title};
