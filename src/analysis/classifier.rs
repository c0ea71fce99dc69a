//! Rule-based heading classification.
//!
//! Each line is scored from independent typographic and structural signals
//! against the document's body size. Every weight and cutoff lives in
//! [`HeadingConfig`], so a signal can be tuned or tested on its own.
//!
//! Level assignment is two-track: a line reaches a level either through the
//! sum of its strong signals (bold, uppercase, numbering, centering) or through
//! a font size margin over body text. Font size alone is an unreliable signal
//! across heterogeneous documents, so it carries a small score weight and only
//! decides the level when the margin is large.

use std::ops::RangeInclusive;

use regex::Regex;

use super::lines::Line;
use crate::model::HeadingLevel;

/// Additive weight of each heading signal.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingWeights {
    /// Multiplier on `(size - body) / max(1, body)`, floored at zero
    pub size: f32,
    /// Boost when the uppercase letter ratio reaches `uppercase_ratio`
    pub uppercase: f32,
    /// Boost for bold lines
    pub bold: f32,
    /// Boost for a leading numbering pattern ("1.", "IV.", "A)", "B.")
    pub numbering: f32,
    /// Boost when the word count is inside `word_window`
    pub length_window: f32,
    /// Boost for a trailing colon
    pub trailing_colon: f32,
    /// Boost for visually centered lines
    pub centered: f32,
    /// Boost for an uppercase first character
    pub leading_capital: f32,
    /// Penalty for embedded '.', ',' or ';' without a trailing colon
    pub punctuation_penalty: f32,
    /// Penalty for lines longer than `long_line_chars`
    pub long_line_penalty: f32,
}

impl Default for HeadingWeights {
    fn default() -> Self {
        Self {
            size: 0.3,
            uppercase: 0.6,
            bold: 1.2,
            numbering: 0.8,
            length_window: 0.5,
            trailing_colon: 0.4,
            centered: 0.3,
            leading_capital: 0.2,
            punctuation_penalty: 0.2,
            long_line_penalty: 0.6,
        }
    }
}

/// Extra formatting the size track needs besides the size margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeGate {
    /// Size margin alone is enough
    None,
    /// Line must also be bold
    Bold,
    /// Line must also be bold or numbered
    BoldOrNumbered,
}

/// Two-track cutoff for one heading level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelRule {
    /// Minimum strong-signal sum
    pub strong: f32,
    /// Minimum `size - body` margin in points for the size track
    pub size_margin: f32,
    /// Formatting the size track additionally requires
    pub size_gate: SizeGate,
}

/// Level cutoffs, strongest first.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelThresholds {
    /// H1 rule
    pub h1: LevelRule,
    /// H2 rule
    pub h2: LevelRule,
    /// H3 rule
    pub h3: LevelRule,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            h1: LevelRule {
                strong: 1.5,
                size_margin: 3.0,
                size_gate: SizeGate::None,
            },
            h2: LevelRule {
                strong: 1.0,
                size_margin: 2.0,
                size_gate: SizeGate::Bold,
            },
            h3: LevelRule {
                strong: 0.5,
                size_margin: 1.0,
                size_gate: SizeGate::BoldOrNumbered,
            },
        }
    }
}

/// Configuration for heading classification and outline acceptance.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingConfig {
    /// Signal weights
    pub weights: HeadingWeights,

    /// Level cutoffs
    pub levels: LevelThresholds,

    /// Minimum score for a leveled line to enter the outline
    pub acceptance_threshold: f32,

    /// Lines shorter than this (in characters) are rejected outright
    pub min_chars: usize,

    /// Uppercase ratio of letters that triggers the uppercase boost
    pub uppercase_ratio: f32,

    /// Word counts that earn the length boost
    pub word_window: RangeInclusive<usize>,

    /// Character length above which the long-line penalty applies
    pub long_line_chars: usize,

    /// Short form-field labels that are never headings (compared lowercase)
    pub form_labels: Vec<String>,

    /// Known truncated-title residue rejected at acceptance (compared lowercase)
    pub fragment_patterns: Vec<String>,

    /// Page width in points, when known; enables true centering detection
    pub page_width: Option<f32>,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            weights: HeadingWeights::default(),
            levels: LevelThresholds::default(),
            acceptance_threshold: 1.0,
            min_chars: 3,
            uppercase_ratio: 0.6,
            word_window: 3..=15,
            long_line_chars: 150,
            form_labels: [
                "name",
                "date",
                "age",
                "email",
                "phone",
                "address",
                "signature",
                "no",
                "yes",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            fragment_patterns: ["rfp:", "rfp: r", "quest f", "r pr", "oposal", "quest for pr"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            page_width: None,
        }
    }
}

impl HeadingConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal weights.
    pub fn with_weights(mut self, weights: HeadingWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the level cutoffs.
    pub fn with_levels(mut self, levels: LevelThresholds) -> Self {
        self.levels = levels;
        self
    }

    /// Set the outline acceptance threshold.
    pub fn with_acceptance_threshold(mut self, threshold: f32) -> Self {
        self.acceptance_threshold = threshold;
        self
    }

    /// Set the page width used for centering detection.
    pub fn with_page_width(mut self, width: f32) -> Self {
        self.page_width = Some(width);
        self
    }
}

/// Per-signal contributions for one line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Signals {
    pub size: f32,
    pub uppercase: f32,
    pub bold: f32,
    pub numbering: f32,
    pub length_window: f32,
    pub trailing_colon: f32,
    pub centered: f32,
    pub leading_capital: f32,
    /// Negative or zero
    pub punctuation: f32,
    /// Negative or zero
    pub long_line: f32,
}

impl Signals {
    /// Sum of every contribution.
    pub fn total(&self) -> f32 {
        self.size
            + self.uppercase
            + self.bold
            + self.numbering
            + self.length_window
            + self.trailing_colon
            + self.centered
            + self.leading_capital
            + self.punctuation
            + self.long_line
    }

    /// Sum of the signals that decide the level independently of font size.
    pub fn strong(&self) -> f32 {
        self.bold + self.uppercase + self.numbering + self.centered
    }
}

/// Result of classifying one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Heading score
    pub score: f32,
    /// Assigned level, `None` for non-headings
    pub level: Option<HeadingLevel>,
}

impl Classification {
    /// A rejected line.
    pub fn rejected() -> Self {
        Self {
            score: 0.0,
            level: None,
        }
    }
}

/// A line with its heading score and level.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingCandidate {
    /// The classified line
    pub line: Line,
    /// Heading score
    pub score: f32,
    /// Assigned level, `None` for non-headings
    pub level: Option<HeadingLevel>,
}

/// Heading classifier.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    config: HeadingConfig,
    numbering: Regex,
}

impl HeadingClassifier {
    /// Create a classifier with the given configuration.
    pub fn new(config: HeadingConfig) -> Self {
        Self {
            config,
            numbering: numbering_pattern(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &HeadingConfig {
        &self.config
    }

    /// Check for a leading "1.", "IV.", "A)" or "B." marker followed by whitespace.
    pub fn is_numbered(&self, text: &str) -> bool {
        self.numbering.is_match(text)
    }

    /// Compute signal contributions, or `None` when the pre-filter rejects the line.
    pub fn signals(&self, line: &Line, body: f32) -> Option<Signals> {
        let text = line.text.trim();
        if self.is_rejected(text) {
            return None;
        }

        let w = &self.config.weights;
        let words = text.split_whitespace().count();
        let chars = text.chars().count();
        let ends_with_colon = text.ends_with(':');

        let size_ratio = ((line.size - body) / body.max(1.0)).max(0.0);

        Some(Signals {
            size: size_ratio * w.size,
            uppercase: flag(uppercase_ratio(text) >= self.config.uppercase_ratio, w.uppercase),
            bold: flag(line.bold, w.bold),
            numbering: flag(self.is_numbered(text), w.numbering),
            length_window: flag(self.config.word_window.contains(&words), w.length_window),
            trailing_colon: flag(ends_with_colon, w.trailing_colon),
            centered: flag(self.is_centered(line), w.centered),
            leading_capital: flag(
                text.chars().next().is_some_and(char::is_uppercase),
                w.leading_capital,
            ),
            punctuation: -flag(
                text.contains(&['.', ',', ';'][..]) && !ends_with_colon,
                w.punctuation_penalty,
            ),
            long_line: -flag(chars > self.config.long_line_chars, w.long_line_penalty),
        })
    }

    /// Score a line and assign its level.
    pub fn classify(&self, line: &Line, body: f32) -> Classification {
        let Some(signals) = self.signals(line, body) else {
            return Classification::rejected();
        };

        let levels = &self.config.levels;
        let numbered = signals.numbering > 0.0;
        let level = [
            (HeadingLevel::H1, &levels.h1),
            (HeadingLevel::H2, &levels.h2),
            (HeadingLevel::H3, &levels.h3),
        ]
        .into_iter()
        .find(|(_, rule)| {
            signals.strong() >= rule.strong
                || size_track(rule, line.size, body, line.bold, numbered)
        })
        .map(|(level, _)| level);

        Classification {
            score: signals.total(),
            level,
        }
    }

    /// Classify a line into a candidate.
    pub fn candidate(&self, line: Line, body: f32) -> HeadingCandidate {
        let Classification { score, level } = self.classify(&line, body);
        HeadingCandidate { line, score, level }
    }

    /// Check whether a candidate enters the outline.
    pub fn accepts(&self, candidate: &HeadingCandidate) -> bool {
        candidate.level.is_some()
            && candidate.score >= self.config.acceptance_threshold
            && !self.looks_like_fragment(&candidate.line.text)
    }

    /// Detect residue of upstream text reconstruction (truncated title pieces).
    pub fn looks_like_fragment(&self, text: &str) -> bool {
        let text = text.trim();
        if text.chars().count() <= 4 {
            return true;
        }

        let lower = text.to_lowercase();
        if self.config.fragment_patterns.iter().any(|p| *p == lower) {
            return true;
        }

        match text.split_whitespace().last() {
            Some(last) => last.chars().count() <= 2 && !is_cased_upper(last),
            None => true,
        }
    }

    /// Pre-filter for lines that can never be headings.
    fn is_rejected(&self, text: &str) -> bool {
        let chars = text.chars().count();
        if chars < self.config.min_chars {
            return true;
        }

        // A line with no letters at all (date range, rule) is never a heading.
        if !text.chars().any(char::is_alphabetic) {
            return true;
        }

        if text.split_whitespace().count() <= 2 && !self.is_numbered(text) {
            let label = text
                .to_lowercase()
                .trim_end_matches(&['.', ':'][..])
                .trim_end()
                .to_string();
            if self.config.form_labels.iter().any(|l| *l == label) {
                return true;
            }

            let all_digits = text.chars().all(char::is_numeric);
            let all_alpha = text.chars().all(char::is_alphabetic);
            if all_digits || (chars <= 3 && !all_alpha) {
                return true;
            }
        }

        false
    }

    fn is_centered(&self, line: &Line) -> bool {
        let bbox = &line.bbox;
        let width = bbox.width();
        match self.config.page_width {
            Some(page_width) if page_width > 0.0 => {
                (bbox.center_x() - page_width / 2.0).abs() < page_width * 0.1
                    && width < page_width * 0.6
            }
            // Without a page width, a clear left margin and a short run stand in for centering.
            _ => bbox.x0 > 50.0 && width < 400.0,
        }
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new(HeadingConfig::default())
    }
}

fn size_track(rule: &LevelRule, size: f32, body: f32, bold: bool, numbered: bool) -> bool {
    if size < body + rule.size_margin {
        return false;
    }
    match rule.size_gate {
        SizeGate::None => true,
        SizeGate::Bold => bold,
        SizeGate::BoldOrNumbered => bold || numbered,
    }
}

fn flag(on: bool, weight: f32) -> f32 {
    if on {
        weight
    } else {
        0.0
    }
}

pub(crate) fn numbering_pattern() -> Regex {
    Regex::new(r"^(?:\d+\.|[IVXLCM]+\.|[A-Z]\)|[A-Z]\.)\s+").expect("numbering pattern is valid")
}

/// Fraction of alphabetic characters that are uppercase.
pub fn uppercase_ratio(text: &str) -> f32 {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(n, u), c| {
            (n + 1, u + usize::from(c.is_uppercase()))
        });
    if letters == 0 {
        0.0
    } else {
        upper as f32 / letters as f32
    }
}

/// True when the word has cased letters and all of them are uppercase.
fn is_cased_upper(word: &str) -> bool {
    let mut cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}
