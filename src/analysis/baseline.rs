//! Body-text font size estimation.

use std::collections::BTreeMap;

use crate::model::Span;

/// Body size used when a document has no spans.
pub const DEFAULT_BODY_SIZE: f32 = 10.0;

/// Estimate the document's body font size.
///
/// Takes the median span size of every page, then the median of those
/// per-page medians. A page dominated by one large heading or decoration
/// moves only its own median, not the document baseline.
pub fn body_size(spans: &[Span]) -> f32 {
    let mut by_page: BTreeMap<u32, Vec<f32>> = BTreeMap::new();
    for span in spans {
        by_page.entry(span.page).or_default().push(span.size);
    }

    let mut page_medians: Vec<f32> = by_page
        .into_values()
        .filter_map(|mut sizes| median(&mut sizes))
        .collect();

    median(&mut page_medians).unwrap_or(DEFAULT_BODY_SIZE)
}

/// Median of the values; the mean of the two middle values for even counts.
pub(crate) fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_default() {
        assert_eq!(body_size(&[]), DEFAULT_BODY_SIZE);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&mut []), None);
    }

    #[test]
    fn test_median_of_page_medians() {
        let spans = vec![
            // Page 1: a cover page dominated by large text, median 24
            Span::new(1, 1, "Cover", 24.0),
            Span::new(1, 2, "Title", 24.0),
            Span::new(1, 3, "small", 9.0),
            // Page 2: median 10
            Span::new(2, 1, "Heading", 14.0),
            Span::new(2, 2, "body", 10.0),
            Span::new(2, 3, "body", 10.0),
            // Page 3: median 10
            Span::new(3, 1, "body", 10.0),
        ];
        assert_eq!(body_size(&spans), 10.0);
    }

    #[test]
    fn test_single_page() {
        let spans = vec![
            Span::new(1, 1, "a", 11.0),
            Span::new(1, 2, "b", 11.0),
            Span::new(1, 3, "c", 18.0),
        ];
        assert_eq!(body_size(&spans), 11.0);
    }
}
