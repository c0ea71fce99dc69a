//! Integration tests for outline inference.

use docoutline::analysis::{assemble_lines, HeadingClassifier, OutlineBuilder};
use docoutline::model::{DocumentOutline, HeadingLevel};
use docoutline::render::{to_json, JsonFormat};
use docoutline::Span;

fn body(page: u32, line_no: u32, text: &str) -> Span {
    Span::new(page, line_no, text, 10.0)
}

fn handbook() -> Vec<Span> {
    vec![
        Span::new(1, 1, "Research Methods Handbook", 18.0).bold(),
        body(1, 2, "This handbook collects the methods used by the lab."),
        Span::new(1, 3, "1. Introduction", 10.5).bold(),
        body(1, 4, "This chapter explains the study design in detail."),
        body(1, 5, "Participants were recruited from three regional clinics."),
        Span::new(2, 1, "2. Data Collection", 12.0).bold(),
        body(2, 2, "Surveys were sent every month over a full year."),
        body(2, 3, "Responses were stored in an encrypted database."),
        Span::new(3, 1, "3. Analysis Plan", 12.0).bold(),
        body(3, 2, "Mixed models were fitted to the repeated measures."),
        body(3, 3, "Missing values were handled with multiple imputation."),
    ]
}

#[test]
fn test_numbered_bold_heading_is_accepted() {
    let outline = OutlineBuilder::new().build(&handbook());
    let intro = outline
        .outline
        .iter()
        .find(|e| e.text == "1. Introduction")
        .expect("introduction heading");
    assert!(intro.level <= HeadingLevel::H3);
    assert_eq!(intro.page, 1);
}

#[test]
fn test_short_form_label_is_rejected() {
    let lines = assemble_lines(&[Span::new(1, 1, "Name", 14.0).bold()]);
    let classification = HeadingClassifier::default().classify(&lines[0], 10.0);
    assert_eq!(classification.score, 0.0);
    assert_eq!(classification.level, None);
}

#[test]
fn test_empty_document() {
    let outline = OutlineBuilder::new().build(&[]);
    assert_eq!(outline, DocumentOutline::empty());
    assert_eq!(
        to_json(&outline, JsonFormat::Compact).unwrap(),
        r#"{"title":"","outline":[]}"#
    );
}

#[test]
fn test_form_document_has_no_outline() {
    let spans = vec![
        Span::new(1, 1, "Application form for grant of LTC advance", 14.0).bold(),
        Span::new(1, 2, "1. Name of the Government Servant", 11.0).bold(),
        Span::new(1, 3, "2. Designation and Pay Level", 11.0).bold(),
        Span::new(1, 4, "3. Amount of advance required", 11.0).bold(),
        Span::new(1, 5, "4. STATION FROM WHICH JOURNEY WILL COMMENCE", 11.0).bold(),
        body(1, 6, "Please attach copies of the tickets with this form."),
    ];
    let outline = OutlineBuilder::new().build(&spans);
    assert!(outline.outline.is_empty());
    assert_eq!(outline.title, "Application form for grant of LTC advance");

    let ungated = OutlineBuilder::new().without_form_detection().build(&spans);
    assert!(!ungated.outline.is_empty());
}

#[test]
fn test_outline_entries_in_document_order() {
    let outline = OutlineBuilder::new().build(&handbook());
    let keys: Vec<_> = outline.outline.iter().map(|e| e.page).collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);

    let texts: Vec<_> = outline.outline.iter().map(|e| e.text.as_str()).collect();
    let intro = texts.iter().position(|t| *t == "1. Introduction").unwrap();
    let data = texts.iter().position(|t| *t == "2. Data Collection").unwrap();
    let analysis = texts.iter().position(|t| *t == "3. Analysis Plan").unwrap();
    assert!(intro < data && data < analysis);
}

#[test]
fn test_span_order_within_page_does_not_matter() {
    let spans = handbook();
    let mut shuffled = spans.clone();
    shuffled.reverse();

    let builder = OutlineBuilder::new();
    assert_eq!(builder.build(&spans), builder.build(&shuffled));
}

#[test]
fn test_accepted_entries_are_real_headings() {
    let outline = OutlineBuilder::new().build(&handbook());
    assert!(!outline.outline.is_empty());
    for entry in &outline.outline {
        assert!(!entry.text.trim().is_empty());
        assert!(entry.text.chars().any(char::is_alphabetic));
        assert!(matches!(
            entry.level,
            HeadingLevel::H1 | HeadingLevel::H2 | HeadingLevel::H3
        ));
    }
    assert!(outline
        .outline
        .iter()
        .all(|e| !e.text.starts_with("This chapter")));
}

#[test]
fn test_bold_lines_without_letters_stay_out_of_outline() {
    let mut spans = handbook();
    spans.extend([
        Span::new(2, 4, "2023 - 2024", 12.0).bold(),
        Span::new(2, 5, "---- ----", 12.0).bold(),
        Span::new(3, 4, "$ 4,500 / 12", 14.0).bold(),
    ]);
    let outline = OutlineBuilder::new().build(&spans);

    let texts: Vec<_> = outline.outline.iter().map(|e| e.text.as_str()).collect();
    assert!(texts.contains(&"2. Data Collection"));
    assert!(texts.contains(&"3. Analysis Plan"));
    for text in texts {
        assert!(text.chars().any(char::is_alphabetic), "{text:?} has no letters");
    }
}

#[test]
fn test_outline_is_idempotent() {
    let builder = OutlineBuilder::new();
    let first = to_json(&builder.build(&handbook()), JsonFormat::Pretty).unwrap();
    let second = to_json(&builder.build(&handbook()), JsonFormat::Pretty).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_title_from_first_page() {
    let outline = OutlineBuilder::new().build(&handbook());
    assert_eq!(outline.title, "Research Methods Handbook");
}
