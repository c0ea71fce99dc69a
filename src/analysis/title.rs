//! Document title selection.

use super::lines::Line;

/// Lowercase prefixes that mark running headers rather than titles.
const EXCLUDED_PREFIXES: [&str; 3] = ["page ", "chapter ", "section "];

/// Pick the document title from the opening lines.
///
/// Candidates are the page 1 lines, or the lines of pages 1-2 when page 1 has
/// none. They are visited largest font first (stable, so encounter order breaks
/// ties). The first line passing [`is_title_like`] wins; failing that, the first
/// line of at least three characters containing a letter; failing that, "".
pub fn select_title(lines: &[Line]) -> String {
    let mut candidates: Vec<&Line> = lines.iter().filter(|l| l.page == 1).collect();
    if candidates.is_empty() {
        candidates = lines.iter().filter(|l| l.page <= 2).collect();
    }

    candidates.sort_by(|a, b| {
        b.size
            .partial_cmp(&a.size)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if let Some(line) = candidates.iter().find(|l| is_title_like(l.text.trim())) {
        return line.text.trim().to_string();
    }

    candidates
        .iter()
        .map(|l| l.text.trim())
        .find(|t| t.chars().count() >= 3 && has_ascii_letter(t))
        .unwrap_or_default()
        .to_string()
}

/// Primary title rule: plausible length and word count, no running-header
/// prefix, and real words rather than numbering or punctuation.
pub fn is_title_like(text: &str) -> bool {
    let chars = text.chars().count();
    let words = text.split_whitespace().count();
    let lower = text.to_lowercase();

    (5..=200).contains(&chars)
        && (2..=20).contains(&words)
        && !EXCLUDED_PREFIXES.iter().any(|p| lower.starts_with(p))
        && !text
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c.is_whitespace())
        && has_ascii_letter(text)
}

fn has_ascii_letter(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn line(page: u32, line_no: u32, text: &str, size: f32) -> Line {
        Line {
            page,
            line_no,
            text: text.to_string(),
            size,
            bold: false,
            bbox: BoundingBox::default(),
        }
    }

    #[test]
    fn test_largest_valid_line_wins() {
        let lines = vec![
            line(1, 1, "Page 1 of 10", 20.0),
            line(1, 2, "Foundations of Data Engineering", 18.0),
            line(1, 3, "A practical guide", 14.0),
            line(2, 1, "Much Larger Second Page Text", 30.0),
        ];
        assert_eq!(select_title(&lines), "Foundations of Data Engineering");
    }

    #[test]
    fn test_size_ties_keep_encounter_order() {
        let lines = vec![
            line(1, 1, "First Candidate Title", 16.0),
            line(1, 2, "Second Candidate Title", 16.0),
        ];
        assert_eq!(select_title(&lines), "First Candidate Title");
    }

    #[test]
    fn test_fallback_accepts_single_word() {
        let lines = vec![line(1, 1, "12", 20.0), line(1, 2, "Overview", 14.0)];
        assert_eq!(select_title(&lines), "Overview");
    }

    #[test]
    fn test_no_candidate_yields_empty_title() {
        let lines = vec![line(1, 1, "42", 20.0), line(1, 2, "--", 14.0)];
        assert_eq!(select_title(&lines), "");
        assert_eq!(select_title(&[]), "");
    }

    #[test]
    fn test_second_page_used_when_first_is_empty() {
        let lines = vec![line(2, 1, "Program Handbook 2024", 18.0)];
        assert_eq!(select_title(&lines), "Program Handbook 2024");
    }

    #[test]
    fn test_is_title_like() {
        assert!(is_title_like("Annual Report"));
        assert!(!is_title_like("Report"));
        assert!(!is_title_like("Chapter 3 Results"));
        assert!(!is_title_like("Section 2.1 Scope"));
        assert!(!is_title_like("1.2 - 3.4"));
        assert!(!is_title_like("Cafés"));
    }
}
