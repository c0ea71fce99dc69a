//! Extractive refinement of ranked sections.

use std::collections::HashSet;

use regex::Regex;

/// Limits for extractive refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineLimits {
    /// Sentences scanned from the start of the section
    pub max_sentences: usize,
    /// Sentences kept in the summary
    pub summary_sentences: usize,
    /// Characters returned when no sentence can be extracted
    pub fallback_chars: usize,
}

impl Default for RefineLimits {
    fn default() -> Self {
        Self {
            max_sentences: 100,
            summary_sentences: 5,
            fallback_chars: 500,
        }
    }
}

/// Query-biased sentence extractor.
#[derive(Debug, Clone)]
pub struct Refiner {
    limits: RefineLimits,
    boundary: Regex,
    word: Regex,
}

impl Refiner {
    /// Create a refiner with the given limits.
    pub fn new(limits: RefineLimits) -> Self {
        Self {
            limits,
            boundary: Regex::new(r"[.!?]\s+").expect("boundary pattern is valid"),
            word: Regex::new(r"\w+").expect("word pattern is valid"),
        }
    }

    /// Split text after sentence-ending punctuation followed by whitespace.
    ///
    /// The punctuation stays with its sentence; blank pieces are dropped.
    pub fn sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.boundary.find_iter(text) {
            // The punctuation mark is a single ASCII byte.
            let end = m.start() + 1;
            push_trimmed(&mut sentences, &text[start..end]);
            start = m.end();
        }
        push_trimmed(&mut sentences, &text[start..]);
        sentences
    }

    /// Distinct lowercase word terms.
    pub fn terms(&self, text: &str) -> HashSet<String> {
        self.word
            .find_iter(&text.to_lowercase())
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Build the refined text of a section for a query.
    ///
    /// Each of the first `max_sentences` sentences scores the share of its
    /// distinct terms that also occur in the query. The best
    /// `summary_sentences` are joined with spaces in score order; equal scores
    /// keep their order in the section. A section without sentences falls back
    /// to its first `fallback_chars` characters.
    pub fn refine(&self, section_text: &str, query_text: &str) -> String {
        let sentences: Vec<&str> = self
            .sentences(section_text)
            .into_iter()
            .take(self.limits.max_sentences)
            .collect();
        if sentences.is_empty() {
            return section_text
                .chars()
                .take(self.limits.fallback_chars)
                .collect();
        }

        let query_terms = self.terms(query_text);
        let mut scored: Vec<(f64, &str)> = sentences
            .into_iter()
            .map(|sentence| {
                let terms = self.terms(sentence);
                let shared = terms.intersection(&query_terms).count();
                (shared as f64 / (terms.len() as f64 + 1e-6), sentence)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(self.limits.summary_sentences)
            .map(|(_, sentence)| sentence)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Refiner {
    fn default() -> Self {
        Self::new(RefineLimits::default())
    }
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, piece: &'a str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece);
    }
}
