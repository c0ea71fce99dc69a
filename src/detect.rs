//! PDF header detection.
//!
//! Span sources check the header before handing a file to the PDF backend, so
//! a mislabelled file fails fast with [`Error::UnknownFormat`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"
const HEADER_LEN: usize = 16;

/// Header information of a PDF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// Read the header of a file and check that it is a PDF.
pub fn detect_pdf_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    File::open(path)?
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    detect_pdf_bytes(&header)
}

/// Check that the bytes start with a PDF header.
///
/// Fails with [`Error::UnknownFormat`] for short data, missing magic bytes or
/// a malformed version.
pub fn detect_pdf_bytes(data: &[u8]) -> Result<PdfHeader> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    match version {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => Ok(PdfHeader {
            version: String::from_utf8_lossy(version).to_string(),
        }),
        _ => Err(Error::UnknownFormat),
    }
}

/// Check whether bytes look like a PDF.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_pdf_bytes(data).is_ok()
}
