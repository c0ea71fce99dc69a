//! Detection of form-like documents.
//!
//! Forms are full of short numbered field labels that look like headings, so
//! outline extraction is skipped for them and only a title is produced.

use regex::Regex;

use super::lines::Line;

/// Configuration for the form gate.
#[derive(Debug, Clone, PartialEq)]
pub struct FormConfig {
    /// Phrases of a known structured-form template (compared lowercase)
    pub indicators: Vec<String>,

    /// Indicator matches that classify a document as a form on their own
    pub min_indicator_matches: usize,

    /// Share of lines with at most two words above which the document looks form-like
    pub short_line_ratio: f32,

    /// Share of lines starting with a field number ("1." to "20.")
    pub numbered_field_ratio: f32,

    /// Share of lines containing a field keyword
    pub keyword_ratio: f32,

    /// Field keywords (compared lowercase)
    pub keywords: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            indicators: [
                "application form for grant of ltc advance",
                "ltc advance",
                "amount of advance required",
                "station from which journey will commence",
                "station up to which ltc is admissible",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            min_indicator_matches: 3,
            short_line_ratio: 0.6,
            numbered_field_ratio: 0.08,
            keyword_ratio: 0.05,
            keywords: ["name:", "date:", "signature:", "required"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Outcome of the form gate, with the measurements behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormVerdict {
    /// Number of template indicators found in the document text
    pub indicator_matches: usize,
    /// Share of short lines
    pub short_ratio: f32,
    /// Share of numbered field lines
    pub numbered_ratio: f32,
    /// Share of keyword lines
    pub keyword_ratio: f32,
    /// Final decision
    pub is_form: bool,
}

/// Form gate.
#[derive(Debug, Clone)]
pub struct FormDetector {
    config: FormConfig,
    field_number: Regex,
}

impl FormDetector {
    /// Create a detector with the given configuration.
    pub fn new(config: FormConfig) -> Self {
        Self {
            config,
            field_number: Regex::new(r"^(?:1[0-9]|20|[1-9])\.").expect("field pattern is valid"),
        }
    }

    /// Check whether the document is a form.
    pub fn is_form(&self, lines: &[Line]) -> bool {
        self.evaluate(lines).is_form
    }

    /// Evaluate both signals.
    ///
    /// The strong signal counts template phrases over the whole document text.
    /// The weak signal, consulted only without the strong one, needs all three
    /// ratios (short lines, numbered fields, field keywords) above their limits.
    pub fn evaluate(&self, lines: &[Line]) -> FormVerdict {
        if lines.is_empty() {
            return FormVerdict {
                indicator_matches: 0,
                short_ratio: 0.0,
                numbered_ratio: 0.0,
                keyword_ratio: 0.0,
                is_form: false,
            };
        }

        let content = lines
            .iter()
            .map(|l| l.text.trim().to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let indicator_matches = self
            .config
            .indicators
            .iter()
            .filter(|i| content.contains(i.as_str()))
            .count();

        let mut short = 0usize;
        let mut numbered = 0usize;
        let mut keyword = 0usize;
        for line in lines {
            let text = line.text.trim().to_lowercase();
            if text.split_whitespace().count() <= 2 {
                short += 1;
            }
            if self.field_number.is_match(&text) {
                numbered += 1;
            }
            if self.config.keywords.iter().any(|k| text.contains(k.as_str())) {
                keyword += 1;
            }
        }

        let total = lines.len() as f32;
        let short_ratio = short as f32 / total;
        let numbered_ratio = numbered as f32 / total;
        let keyword_ratio = keyword as f32 / total;

        let strong = indicator_matches >= self.config.min_indicator_matches;
        let weak = numbered_ratio > self.config.numbered_field_ratio
            && keyword_ratio > self.config.keyword_ratio
            && short_ratio > self.config.short_line_ratio;

        FormVerdict {
            indicator_matches,
            short_ratio,
            numbered_ratio,
            keyword_ratio,
            is_form: strong || weak,
        }
    }
}

impl Default for FormDetector {
    fn default() -> Self {
        Self::new(FormConfig::default())
    }
}

/// Pick a form's title: favour large, bold, first-page, early lines of a
/// reasonable length among pages 1-2.
///
/// Score is `2·size + 10·bold + 5·(page 1) + 3·(10..=100 chars) − line_no`.
/// Ties go to the earliest line.
pub fn select_form_title(lines: &[Line]) -> String {
    let mut best: Option<(f32, &str)> = None;
    for line in lines.iter().filter(|l| l.page <= 2) {
        let text = line.text.trim();
        let chars = text.chars().count();
        if !(3..=200).contains(&chars) {
            continue;
        }

        let mut score = line.size * 2.0 - line.line_no as f32;
        if line.bold {
            score += 10.0;
        }
        if line.page == 1 {
            score += 5.0;
        }
        if (10..=100).contains(&chars) {
            score += 3.0;
        }

        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, text));
        }
    }

    best.map(|(_, text)| text.to_string()).unwrap_or_default()
}
