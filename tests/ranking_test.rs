//! Integration tests for section ranking.

use std::sync::atomic::{AtomicUsize, Ordering};

use docoutline::analysis::segment_sections;
use docoutline::error::{Error, Result};
use docoutline::model::{DocumentOutline, HeadingLevel, OutlineEntry, Query, Section};
use docoutline::rank::{
    cosine_similarity, l2_normalize, CandidateSection, Embedder, HashingEmbedder, RankOptions,
    RelevanceRanker,
};
use docoutline::Span;

const TOPICS: [&str; 3] = ["beach", "food", "museum"];

/// Counts topic words; one dimension per topic.
#[derive(Default)]
struct TopicEmbedder {
    calls: AtomicUsize,
}

impl Embedder for TopicEmbedder {
    fn dimension(&self) -> usize {
        TOPICS.len()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let mut v: Vec<f32> = TOPICS
                    .iter()
                    .map(|t| lower.matches(t).count() as f32)
                    .collect();
                l2_normalize(&mut v);
                v
            })
            .collect())
    }
}

struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn dimension(&self) -> usize {
        8
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Err(Error::Embedding("model unavailable".to_string()))
    }
}

fn section(title: &str, page: u32, text: &str) -> Section {
    Section {
        title: title.to_string(),
        level: HeadingLevel::H1,
        page_start: page,
        text: text.to_string(),
    }
}

fn ten_sections() -> Vec<CandidateSection> {
    let topic_text = |topic: &str, n: usize| {
        (0..8)
            .map(|i| {
                if i < n {
                    format!("The {} guide entry number {} is here.", topic, i)
                } else {
                    format!("Filler sentence number {} has nothing to add.", i)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    vec![
        CandidateSection::new("south.pdf", section("Beaches", 1, &topic_text("beach", 6))),
        CandidateSection::new("south.pdf", section("Markets", 2, &topic_text("food", 2))),
        CandidateSection::new("south.pdf", section("Galleries", 3, &topic_text("museum", 5))),
        CandidateSection::new("north.pdf", section("Coast", 1, &topic_text("beach", 3))),
        CandidateSection::new("north.pdf", section("Cuisine", 2, &topic_text("food", 7))),
        CandidateSection::new("north.pdf", section("History", 4, &topic_text("museum", 1))),
        CandidateSection::new("east.pdf", section("Dining", 1, &topic_text("food", 4))),
        CandidateSection::new("east.pdf", section("Transport", 2, &topic_text("bus", 4))),
        CandidateSection::new("east.pdf", section("Nightlife", 5, &topic_text("club", 3))),
        CandidateSection::new("east.pdf", section("Tips", 6, &topic_text("packing", 2))),
    ]
}

fn sentence_count(text: &str) -> usize {
    text.matches(". ").count() + usize::from(text.ends_with('.'))
}

#[test]
fn test_top_three_of_ten_sections() {
    let ranker = RelevanceRanker::new(TopicEmbedder::default());
    let query = Query::new("Food critic", "Find the best food").with_top_k(3);
    let ranking = ranker.rank(&query, &ten_sections()).unwrap();

    assert_eq!(ranking.results.len(), 3);
    let ranks: Vec<_> = ranking.results.iter().map(|r| r.importance_rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);

    let titles: Vec<_> = ranking
        .results
        .iter()
        .map(|r| r.section_title.as_str())
        .collect();
    assert_eq!(titles, vec!["Markets", "Cuisine", "Dining"]);

    for refined in &ranking.refined {
        assert!(sentence_count(&refined.refined_text) <= 5);
    }
}

#[test]
fn test_rank_one_has_highest_similarity() {
    let ranker = RelevanceRanker::new(HashingEmbedder::new());
    let query = Query::new("Beach lover", "Find sunny beach spots").with_top_k(10);
    let ranking = ranker.rank(&query, &ten_sections()).unwrap();

    assert_eq!(ranking.results.len(), 10);
    assert!(ranking.scores.windows(2).all(|w| w[0] >= w[1]));

    let mut ranks: Vec<_> = ranking.results.iter().map(|r| r.importance_rank).collect();
    ranks.sort();
    assert_eq!(ranks, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_top_k_larger_than_section_count() {
    let ranker = RelevanceRanker::new(TopicEmbedder::default());
    let query = Query::new("", "museum visits").with_top_k(50);
    let sections = &ten_sections()[..4];
    let ranking = ranker.rank(&query, sections).unwrap();
    assert_eq!(ranking.results.len(), 4);
    assert_eq!(ranking.results[0].section_title, "Galleries");
}

#[test]
fn test_no_sections_means_no_embedding_call() {
    let embedder = TopicEmbedder::default();
    let ranker = RelevanceRanker::new(&embedder);
    let ranking = ranker.rank(&Query::new("Chef", "Menu"), &[]).unwrap();
    assert!(ranking.results.is_empty());
    assert!(ranking.refined.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_batches_do_not_change_results() {
    let query = Query::new("Food critic", "Find the best food").with_top_k(5);
    let whole = RelevanceRanker::new(TopicEmbedder::default())
        .rank(&query, &ten_sections())
        .unwrap();

    let embedder = TopicEmbedder::default();
    let batched = RelevanceRanker::with_options(&embedder, RankOptions::new().with_batch_size(3))
        .rank(&query, &ten_sections())
        .unwrap();

    assert_eq!(whole, batched);
    // Ten sections in batches of three, plus the query.
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_embedding_failure_is_fatal() {
    let ranker = RelevanceRanker::new(FailingEmbedder);
    let err = ranker
        .rank(&Query::new("Chef", "Menu"), &ten_sections())
        .unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[test]
fn test_rank_segmented_document() {
    let spans = vec![
        Span::new(1, 1, "Front matter that precedes any heading.", 10.0),
        Span::new(2, 1, "Beaches", 14.0).bold(),
        Span::new(2, 2, "The beach is wide. The beach is sandy.", 10.0),
        Span::new(3, 1, "Museums", 14.0).bold(),
        Span::new(3, 2, "The museum opens at nine.", 10.0),
    ];
    let outline = DocumentOutline {
        title: "Guide".to_string(),
        outline: vec![
            OutlineEntry::new(HeadingLevel::H1, "Beaches", 2),
            OutlineEntry::new(HeadingLevel::H1, "Museums", 3),
        ],
    };

    let candidates: Vec<_> = segment_sections(&spans, &outline)
        .into_iter()
        .map(|s| CandidateSection::new("guide.pdf", s))
        .collect();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| !c.section.text.contains("Front matter")));

    let ranking = RelevanceRanker::new(TopicEmbedder::default())
        .rank(&Query::new("", "beach day").with_top_k(1), &candidates)
        .unwrap();
    assert_eq!(ranking.results[0].section_title, "Beaches");
    assert_eq!(ranking.results[0].page_number, 2);
    assert_eq!(ranking.refined[0].document, "guide.pdf");
    assert!(ranking.refined[0].refined_text.contains("beach"));
}

#[test]
fn test_cosine_of_normalized_vectors() {
    let embedder = HashingEmbedder::new();
    let a = embedder.embed("coastal walking routes").unwrap();
    let b = embedder.embed("coastal walking routes").unwrap();
    assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
}
