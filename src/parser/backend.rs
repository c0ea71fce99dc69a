//! Document access behind a trait.
//!
//! The span reader only sees pages as operation lists, font tables and a
//! page height. [`LopdfBackend`] provides those from a parsed file; tests
//! provide them from memory.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Font resource name of a page mapped to its base font name.
pub type FontTable = HashMap<Vec<u8>, String>;

/// Height of a US Letter page, used when no MediaBox can be read.
pub const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

/// Upper bound on `Parent` hops when resolving inherited page attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// Operand of a content stream operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<Operand>),
    Other,
}

impl Operand {
    pub(crate) fn number(&self) -> Option<f32> {
        match *self {
            Operand::Integer(i) => Some(i as f32),
            Operand::Real(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&Object> for Operand {
    fn from(obj: &Object) -> Self {
        match obj {
            Object::Integer(i) => Operand::Integer(*i),
            Object::Real(r) => Operand::Real(*r),
            Object::Name(n) => Operand::Name(n.clone()),
            Object::String(bytes, _) => Operand::Str(bytes.clone()),
            Object::Array(items) => Operand::Array(items.iter().map(Operand::from).collect()),
            _ => Operand::Other,
        }
    }
}

/// One operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<Operand>,
}

impl ContentOp {
    /// Numeric operand at `idx`, or `default`.
    pub fn number(&self, idx: usize, default: f32) -> f32 {
        self.operands
            .get(idx)
            .and_then(Operand::number)
            .unwrap_or(default)
    }
}

/// Read access to the pages of a document.
pub trait PdfBackend {
    /// Page number (1-based) to page id, in page order.
    fn page_map(&self) -> BTreeMap<u32, PageId>;

    /// Fonts declared in the page resources. Empty when unreadable.
    fn font_table(&self, page: PageId) -> FontTable;

    /// Page height in points.
    fn page_height(&self, page: PageId) -> f32;

    /// Operations of the page content, all streams concatenated.
    fn operations(&self, page: PageId) -> Result<Vec<ContentOp>>;

    /// Turn string operand bytes into text using the font's encoding.
    fn decode_string(&self, page: PageId, font: &[u8], bytes: &[u8]) -> String;
}

/// Encoding-free decoding: UTF-16BE when a byte order mark is present,
/// then UTF-8, then Latin-1.
pub fn fallback_decode(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => match std::str::from_utf8(bytes) {
            Ok(text) => text.to_owned(),
            Err(_) => bytes.iter().copied().map(char::from).collect(),
        },
    }
}

/// [`PdfBackend`] over a document parsed by lopdf.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Parse a file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_document(LopdfDocument::load(path)?)
    }

    /// Parse an in-memory document.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        Self::from_document(LopdfDocument::load_mem(data)?)
    }

    fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            Err(Error::Encrypted)
        } else {
            Ok(Self { doc })
        }
    }

    /// Declared PDF version, e.g. "1.7".
    pub fn version(&self) -> &str {
        &self.doc.version
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    /// Decoded bytes of a stream object; raw bytes when the filter is unsupported.
    fn stream_bytes(&self, id: ObjectId) -> Option<Vec<u8>> {
        let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
        Some(
            stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone()),
        )
    }

    /// Page attribute, looked up through the `Parent` chain.
    fn inherited(&self, page: PageId, key: &[u8]) -> Option<&Object> {
        let mut dict: &Dictionary = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERIT_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }
}

impl PdfBackend for LopdfBackend {
    fn page_map(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn font_table(&self, page: PageId) -> FontTable {
        let Ok(fonts) = self.doc.get_page_fonts(page) else {
            return FontTable::new();
        };
        fonts
            .into_iter()
            .map(|(resource, dict)| {
                let base = dict
                    .get(b"BaseFont")
                    .and_then(Object::as_name)
                    .unwrap_or(resource.as_slice());
                let base = String::from_utf8_lossy(base).into_owned();
                (resource, base)
            })
            .collect()
    }

    fn page_height(&self, page: PageId) -> f32 {
        let corners: Vec<f32> = self
            .inherited(page, b"MediaBox")
            .and_then(|obj| obj.as_array().ok())
            .map(|items| items.iter().filter_map(|v| v.as_float().ok()).collect())
            .unwrap_or_default();
        match corners.as_slice() {
            [_, y0, _, y1, ..] if (y1 - y0).abs() > 0.0 => (y1 - y0).abs(),
            _ => DEFAULT_PAGE_HEIGHT,
        }
    }

    fn operations(&self, page: PageId) -> Result<Vec<ContentOp>> {
        let dict = self.doc.get_dictionary(page)?;
        let data = match dict.get(b"Contents").ok() {
            // No content means a blank page.
            None => return Ok(Vec::new()),
            Some(Object::Reference(id)) => self
                .stream_bytes(*id)
                .ok_or_else(|| Error::PdfParse(format!("page {:?}: unreadable contents", page)))?,
            Some(Object::Array(parts)) => parts
                .iter()
                .filter_map(|part| part.as_reference().ok())
                .filter_map(|id| self.stream_bytes(id))
                .fold(Vec::new(), |mut acc, bytes| {
                    acc.extend_from_slice(&bytes);
                    acc.push(b'\n');
                    acc
                }),
            Some(_) => {
                return Err(Error::PdfParse(format!(
                    "page {:?}: contents is not a stream",
                    page
                )))
            }
        };

        let content = lopdf::content::Content::decode(&data)?;
        Ok(content
            .operations
            .iter()
            .map(|op| ContentOp {
                operator: op.operator.clone(),
                operands: op.operands.iter().map(Operand::from).collect(),
            })
            .collect())
    }

    fn decode_string(&self, page: PageId, font: &[u8], bytes: &[u8]) -> String {
        self.doc
            .get_page_fonts(page)
            .ok()
            .and_then(|fonts| {
                let encoding = fonts.get(font)?.get_font_encoding(&self.doc).ok()?;
                LopdfDocument::decode_text(&encoding, bytes).ok()
            })
            .unwrap_or_else(|| fallback_decode(bytes))
    }
}
