//! PDF span extraction.

mod backend;
mod content;
mod options;
mod reader;

pub use backend::{
    fallback_decode, ContentOp, FontTable, LopdfBackend, Operand, PageId, PdfBackend,
    DEFAULT_PAGE_HEIGHT,
};
pub use content::{is_bold_font, read_page_runs, TextRun};
pub use options::{ErrorMode, ExtractOptions, PageSelection};
pub use reader::{runs_to_spans, PdfSpanReader};
