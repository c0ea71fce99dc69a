//! Crate-wide error type.

use std::io;
use thiserror::Error;

/// Shorthand for results carrying [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while reading documents, building outlines, or ranking sections.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input bytes do not start with a `%PDF-` header.
    #[error("not a PDF document")]
    UnknownFormat,

    /// The file has a PDF header but its structure cannot be read.
    #[error("malformed PDF: {0}")]
    PdfParse(String),

    #[error("PDF is encrypted")]
    Encrypted,

    /// A span source failed on a document.
    #[error("cannot extract spans: {0}")]
    Extraction(String),

    /// An explicitly selected page does not exist: (requested, page count).
    #[error("page {0} requested but the document has {1} pages")]
    PageOutOfRange(u32, u32),

    /// The embedder failed or returned vectors that do not match its input.
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            other => Error::PdfParse(other.to_string()),
        }
    }
}

#[cfg(feature = "model")]
impl From<candle_core::Error> for Error {
    fn from(err: candle_core::Error) -> Self {
        Error::Embedding(err.to_string())
    }
}
