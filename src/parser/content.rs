//! Content-stream walking: positioned text runs from page operations.

use super::backend::{ContentOp, FontTable, Operand, PageId, PdfBackend};
use crate::error::Result;

/// Font size assumed before the first `Tf`.
const DEFAULT_FONT_SIZE: f32 = 12.0;

/// TJ adjustment (thousandths of an em) treated as a word break.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Average glyph advance as a fraction of font size, used without font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// A run of text drawn by one text-showing operator.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    /// Decoded text
    pub text: String,
    /// X position of the run start (PDF user space)
    pub x: f32,
    /// Baseline Y position (PDF user space, bottom-up)
    pub y: f32,
    /// Estimated run width
    pub width: f32,
    /// Effective font size in points
    pub size: f32,
    /// Base font name
    pub font: String,
}

impl TextRun {
    /// Heuristic boldness from the font name.
    pub fn is_bold(&self) -> bool {
        is_bold_font(&self.font)
    }
}

/// Check a base font name for a heavy weight.
pub fn is_bold_font(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("bold") || lower.contains("black") || lower.contains("heavy")
}

/// Text matrix and line state while walking a content stream.
#[derive(Debug, Clone)]
struct TextState {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    // Line matrix origin, restored by Td/TD/T*
    line_e: f32,
    line_f: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            line_e: 0.0,
            line_f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn begin(&mut self) {
        let leading = self.leading;
        *self = Self {
            leading,
            ..Self::default()
        };
    }

    fn set_matrix(&mut self, m: [f32; 6]) {
        let [a, b, c, d, e, f] = m;
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
        self.line_e = e;
        self.line_f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.line_e += tx * self.a + ty * self.c;
        self.line_f += tx * self.b + ty * self.d;
        self.e = self.line_e;
        self.f = self.line_f;
    }

    fn next_line(&mut self, font_size: f32) {
        // Without TL, fall back to single spacing at the current size.
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            font_size
        };
        self.translate(0.0, -leading);
    }

    fn advance(&mut self, width: f32) {
        self.e += width;
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Walk a page's content stream and collect its text runs in drawing order.
///
/// Handles BT/ET, Tf, Td/TD/TL, Tm, T*, Tj/TJ and the `'`/`"` operators.
/// Runs with blank text are dropped. Positions come from the text matrix; run
/// widths are estimated from the character count since font metrics are not
/// consulted.
pub fn read_page_runs<B: PdfBackend + ?Sized>(backend: &B, page: PageId) -> Result<Vec<TextRun>> {
    let fonts = backend.font_table(page);
    let operations = backend.operations(page)?;
    let decode = |font: &[u8], bytes: &[u8]| backend.decode_string(page, font, bytes);
    Ok(walk_operations(&operations, decode, &fonts))
}

/// Run the text-state machine over decoded operations.
pub(crate) fn walk_operations<D>(
    operations: &[ContentOp],
    decode: D,
    fonts: &FontTable,
) -> Vec<TextRun>
where
    D: Fn(&[u8], &[u8]) -> String,
{
    let mut runs = Vec::new();
    let mut state = TextState::default();
    let mut in_text = false;
    let mut font_key: Vec<u8> = Vec::new();
    let mut font_name = String::new();
    let mut font_size = DEFAULT_FONT_SIZE;

    for op in operations {
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                state.begin();
            }
            "ET" => in_text = false,
            "Tf" => {
                if let Some(Operand::Name(name)) = op.operands.first() {
                    font_key = name.clone();
                    font_name = fonts
                        .get(name)
                        .cloned()
                        .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                }
                font_size = op.number(1, DEFAULT_FONT_SIZE);
            }
            "TL" => state.leading = op.number(0, 0.0),
            "Td" => state.translate(op.number(0, 0.0), op.number(1, 0.0)),
            "TD" => {
                let ty = op.number(1, 0.0);
                state.leading = -ty;
                state.translate(op.number(0, 0.0), ty);
            }
            "Tm" if op.operands.len() >= 6 => state.set_matrix([
                op.number(0, 1.0),
                op.number(1, 0.0),
                op.number(2, 0.0),
                op.number(3, 1.0),
                op.number(4, 0.0),
                op.number(5, 0.0),
            ]),
            "T*" => state.next_line(font_size),
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(op.operator.as_str(), "'" | "\"") {
                    state.next_line(font_size);
                }
                if !in_text {
                    continue;
                }

                let text = match op.operator.as_str() {
                    "TJ" => match op.operands.first() {
                        Some(Operand::Array(items)) => {
                            decode_tj_array(items, |b| decode(font_key.as_slice(), b))
                        }
                        _ => String::new(),
                    },
                    "\"" => {
                        string_operand(op.operands.get(2), |b| decode(font_key.as_slice(), b))
                    }
                    _ => string_operand(op.operands.first(), |b| decode(font_key.as_slice(), b)),
                };

                let size = font_size * state.scale();
                let width = text.chars().count() as f32 * size * AVG_GLYPH_WIDTH;
                if !text.trim().is_empty() {
                    runs.push(TextRun {
                        text,
                        x: state.e,
                        y: state.f,
                        width,
                        size,
                        font: font_name.clone(),
                    });
                }
                state.advance(width);
            }
            _ => {}
        }
    }

    runs
}

fn string_operand<F: Fn(&[u8]) -> String>(value: Option<&Operand>, decode: F) -> String {
    match value {
        Some(Operand::Str(bytes)) => decode(bytes.as_slice()),
        _ => String::new(),
    }
}

/// Join the strings of a TJ array, turning large negative kerning into spaces.
fn decode_tj_array<F: Fn(&[u8]) -> String>(items: &[Operand], decode: F) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            Operand::Str(bytes) => combined.push_str(&decode(bytes.as_slice())),
            Operand::Integer(_) | Operand::Real(_) => {
                let adjustment = -item.number().unwrap_or(0.0);
                let needs_space = adjustment > TJ_SPACE_THRESHOLD
                    && combined
                        .chars()
                        .last()
                        .is_some_and(|c| !c.is_whitespace() && !is_spaceless_script_char(c));
                if needs_space {
                    combined.push(' ');
                }
            }
            _ => {}
        }
    }
    combined
}

/// Scripts written without spaces between words (Chinese, Japanese).
fn is_spaceless_script_char(c: char) -> bool {
    matches!(
        c as u32,
        0x4E00..=0x9FFF        // CJK Unified Ideographs
            | 0x3400..=0x4DBF  // Extension A
            | 0x20000..=0x2EBEF // Extensions B-F
            | 0x3040..=0x309F  // Hiragana
            | 0x30A0..=0x30FF  // Katakana
            | 0x3000..=0x303F // CJK Symbols and Punctuation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(operator: &str, operands: Vec<Operand>) -> ContentOp {
        ContentOp {
            operator: operator.to_string(),
            operands,
        }
    }

    fn name(s: &str) -> Operand {
        Operand::Name(s.as_bytes().to_vec())
    }

    fn string(s: &str) -> Operand {
        Operand::Str(s.as_bytes().to_vec())
    }

    fn walk(ops: &[ContentOp]) -> Vec<TextRun> {
        let fonts = FontTable::from([
            (b"F1".to_vec(), "Helvetica-Bold".to_string()),
            (b"F2".to_vec(), "Helvetica".to_string()),
        ]);
        walk_operations(ops, |_, b| String::from_utf8_lossy(b).to_string(), &fonts)
    }

    #[test]
    fn test_runs_carry_position_font_and_size() {
        let runs = walk(&[
            op("BT", vec![]),
            op("Tf", vec![name("F1"), Operand::Integer(18)]),
            op("Td", vec![Operand::Integer(72), Operand::Integer(700)]),
            op("Tj", vec![string("Title")]),
            op("Tf", vec![name("F2"), Operand::Integer(10)]),
            op("Td", vec![Operand::Integer(0), Operand::Integer(-30)]),
            op("Tj", vec![string("Body text")]),
            op("ET", vec![]),
        ]);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Title");
        assert_eq!((runs[0].x, runs[0].y), (72.0, 700.0));
        assert_eq!(runs[0].size, 18.0);
        assert!(runs[0].is_bold());
        assert_eq!(runs[1].y, 670.0);
        // Td moves from the line start, not from the end of the previous run.
        assert_eq!(runs[1].x, 72.0);
        assert!(!runs[1].is_bold());
    }

    #[test]
    fn test_tm_scales_font_size() {
        let runs = walk(&[
            op("BT", vec![]),
            op("Tf", vec![name("F2"), Operand::Integer(1)]),
            op(
                "Tm",
                vec![
                    Operand::Integer(14),
                    Operand::Integer(0),
                    Operand::Integer(0),
                    Operand::Integer(14),
                    Operand::Integer(100),
                    Operand::Integer(500),
                ],
            ),
            op("Tj", vec![string("Scaled")]),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[0].size, 14.0);
        assert_eq!((runs[0].x, runs[0].y), (100.0, 500.0));
    }

    #[test]
    fn test_leading_and_next_line() {
        let runs = walk(&[
            op("BT", vec![]),
            op("Tf", vec![name("F2"), Operand::Integer(10)]),
            op("TL", vec![Operand::Integer(14)]),
            op("Td", vec![Operand::Integer(50), Operand::Integer(600)]),
            op("Tj", vec![string("one")]),
            op("T*", vec![]),
            op("Tj", vec![string("two")]),
            op("'", vec![string("three")]),
            op("ET", vec![]),
        ]);
        let ys: Vec<_> = runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![600.0, 586.0, 572.0]);
    }

    #[test]
    fn test_tj_array_spacing() {
        let runs = walk(&[
            op("BT", vec![]),
            op(
                "TJ",
                vec![Operand::Array(vec![
                    string("Hello"),
                    Operand::Integer(-250),
                    string("World"),
                    Operand::Integer(-30),
                    string("!"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[0].text, "Hello World!");
    }

    #[test]
    fn test_tj_array_real_kerning_and_cjk() {
        let runs = walk(&[
            op("BT", vec![]),
            op(
                "TJ",
                vec![Operand::Array(vec![
                    string("Annual"),
                    Operand::Real(-250.5),
                    string("Report"),
                    Operand::Real(300.0),
                    string("s"),
                ])],
            ),
            op("Td", vec![Operand::Integer(0), Operand::Integer(-20)]),
            op(
                "TJ",
                vec![Operand::Array(vec![
                    string("\u{5e74}\u{5831}"),
                    Operand::Integer(-400),
                    string("\u{6982}\u{8981}"),
                ])],
            ),
            op("ET", vec![]),
        ]);
        assert_eq!(runs[0].text, "Annual Reports");
        // No space is inserted between ideographs.
        assert_eq!(runs[1].text, "\u{5e74}\u{5831}\u{6982}\u{8981}");
    }

    #[test]
    fn test_text_outside_bt_and_blank_runs_are_ignored() {
        let runs = walk(&[
            op("Tj", vec![string("stray")]),
            op("BT", vec![]),
            op("Tj", vec![string("   ")]),
            op("ET", vec![]),
        ]);
        assert!(runs.is_empty());
    }

    #[test]
    fn test_bold_font_names() {
        assert!(is_bold_font("Arial-BoldMT"));
        assert!(is_bold_font("Helvetica-Black"));
        assert!(!is_bold_font("Times-Roman"));
    }
}
