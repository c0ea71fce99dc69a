//! Section relevance ranking.

use log::debug;

use super::embedder::Embedder;
use super::refine::{RefineLimits, Refiner};
use crate::error::{Error, Result};
use crate::model::{Query, RankedResult, RefinedSubsection, Section, DEFAULT_TOP_K};

/// Options for relevance ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankOptions {
    /// Sections returned when the query does not set `top_k`
    pub top_k: usize,

    /// Section text is cut to this many characters before embedding
    pub max_section_chars: usize,

    /// Texts sent to the embedder per call
    pub batch_size: usize,

    /// Extractive refinement limits
    pub refine: RefineLimits,
}

impl RankOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default number of results.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the per-section character budget.
    pub fn with_max_section_chars(mut self, chars: usize) -> Self {
        self.max_section_chars = chars;
        self
    }

    /// Set the embedding batch size.
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the refinement limits.
    pub fn with_refine_limits(mut self, limits: RefineLimits) -> Self {
        self.refine = limits;
        self
    }
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_section_chars: 3000,
            batch_size: 64,
            refine: RefineLimits::default(),
        }
    }
}

/// A section tagged with the document it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSection {
    /// Document file name
    pub document: String,
    /// The section
    pub section: Section,
}

impl CandidateSection {
    /// Tag a section with its document.
    pub fn new(document: impl Into<String>, section: Section) -> Self {
        Self {
            document: document.into(),
            section,
        }
    }
}

/// Ranked sections with their refined text, in rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Ranked sections
    pub results: Vec<RankedResult>,
    /// Refined text, parallel to `results`
    pub refined: Vec<RefinedSubsection>,
    /// Similarity of each ranked section, parallel to `results`
    pub scores: Vec<f32>,
}

/// Ranks sections against a query by embedding similarity.
pub struct RelevanceRanker<E: Embedder> {
    embedder: E,
    options: RankOptions,
    refiner: Refiner,
}

impl<E: Embedder> RelevanceRanker<E> {
    /// Create a ranker with default options.
    pub fn new(embedder: E) -> Self {
        Self::with_options(embedder, RankOptions::default())
    }

    /// Create a ranker with custom options.
    pub fn with_options(embedder: E, options: RankOptions) -> Self {
        let refiner = Refiner::new(options.refine);
        Self {
            embedder,
            options,
            refiner,
        }
    }

    /// The active options.
    pub fn options(&self) -> &RankOptions {
        &self.options
    }

    /// Rank sections against a query.
    ///
    /// Returns `min(top_k, sections)` results with ranks `1..=K` in descending
    /// similarity; equal similarities keep section order. No embedding call is
    /// made when there are no sections. Embedding errors are fatal for the
    /// query.
    pub fn rank(&self, query: &Query, sections: &[CandidateSection]) -> Result<Ranking> {
        if sections.is_empty() {
            return Ok(Ranking::default());
        }

        let top_k = if query.top_k == 0 {
            self.options.top_k
        } else {
            query.top_k
        };

        let texts: Vec<String> = sections
            .iter()
            .map(|c| truncate_chars(&c.section.text, self.options.max_section_chars))
            .collect();
        let query_text = query.query_text();

        let section_vectors = self.embed_all(&texts)?;
        let query_vector = self.embed_all(&[query_text.clone()])?.pop().ok_or_else(|| {
            Error::Embedding("no vector returned for the query".to_string())
        })?;

        let similarities: Vec<f32> = section_vectors
            .iter()
            .map(|v| cosine_similarity(&query_vector, v))
            .collect();

        let order = top_indices(&similarities, top_k);
        debug!(
            "ranked {} sections, keeping {} for query {:?}",
            sections.len(),
            order.len(),
            query_text
        );

        let mut ranking = Ranking::default();
        for (rank, &idx) in order.iter().enumerate() {
            let candidate = &sections[idx];
            let section = &candidate.section;
            ranking.results.push(RankedResult {
                document: candidate.document.clone(),
                page_number: section.page_start,
                section_title: section.title.clone(),
                importance_rank: rank + 1,
            });
            ranking.refined.push(RefinedSubsection {
                document: candidate.document.clone(),
                section_title: section.title.clone(),
                refined_text: self.refiner.refine(&texts[idx], &query_text),
                page_number: section.page_start,
            });
            ranking.scores.push(similarities[idx]);
        }

        Ok(ranking)
    }

    /// Embed texts in fixed-size batches, checking count and dimension.
    fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let dimension = self.embedder.dimension();
        let batch_size = self.options.batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(batch_size) {
            let batch: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let embedded = self.embedder.embed_batch(&batch)?;
            if embedded.len() != batch.len() {
                return Err(Error::Embedding(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            if let Some(bad) = embedded.iter().find(|v| v.len() != dimension) {
                return Err(Error::Embedding(format!(
                    "expected dimension {}, got {}",
                    dimension,
                    bad.len()
                )));
            }
            vectors.extend(embedded);
        }

        Ok(vectors)
    }
}

/// Cosine similarity; zero when either vector is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

/// Indices of the `k` largest scores, best first; ties keep index order.
fn top_indices(scores: &[f32], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.truncate(k);
    order
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HeadingLevel;
    use crate::rank::HashingEmbedder;

    fn section(title: &str, text: &str) -> CandidateSection {
        CandidateSection::new(
            "guide.pdf",
            Section {
                title: title.to_string(),
                level: HeadingLevel::H1,
                page_start: 1,
                text: text.to_string(),
            },
        )
    }

    struct ShortEmbedder;

    impl Embedder for ShortEmbedder {
        fn dimension(&self) -> usize {
            4
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
        }
    }

    struct WrongDimension;

    impl Embedder for WrongDimension {
        fn dimension(&self) -> usize {
            4
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_top_indices_stable_on_ties() {
        assert_eq!(top_indices(&[0.5, 0.9, 0.5, 0.1], 3), vec![1, 0, 2]);
        assert_eq!(top_indices(&[0.2], 5), vec![0]);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_rank_orders_by_similarity() {
        let ranker = RelevanceRanker::new(HashingEmbedder::new());
        let sections = vec![
            section("Taxes", "Quarterly tax filing deadlines and forms."),
            section("Beaches", "The best beaches for a group trip with friends."),
            section("Museums", "Museum opening hours and ticket prices."),
        ];
        let query = Query::new("Travel planner", "beaches for a group trip");
        let ranking = ranker.rank(&query, &sections).unwrap();

        assert_eq!(ranking.results.len(), 3);
        assert_eq!(ranking.results[0].section_title, "Beaches");
        let ranks: Vec<_> = ranking.results.iter().map(|r| r.importance_rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert!(ranking.scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_rank_respects_top_k() {
        let ranker = RelevanceRanker::new(HashingEmbedder::new());
        let sections: Vec<_> = (0..6)
            .map(|i| section(&format!("S{}", i), &format!("Section body {}.", i)))
            .collect();
        let query = Query::new("Analyst", "section body").with_top_k(2);
        let ranking = ranker.rank(&query, &sections).unwrap();
        assert_eq!(ranking.results.len(), 2);
        assert_eq!(ranking.refined.len(), 2);
    }

    #[test]
    fn test_rank_without_sections_skips_embedding() {
        let ranker = RelevanceRanker::new(WrongDimension);
        let ranking = ranker.rank(&Query::new("a", "b"), &[]).unwrap();
        assert!(ranking.results.is_empty());
    }

    #[test]
    fn test_embedding_count_mismatch_is_error() {
        let ranker = RelevanceRanker::new(ShortEmbedder);
        let err = ranker
            .rank(&Query::new("a", "b"), &[section("One", "text")])
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_embedding_dimension_mismatch_is_error() {
        let ranker = RelevanceRanker::new(WrongDimension);
        let err = ranker
            .rank(&Query::new("a", "b"), &[section("One", "text")])
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[test]
    fn test_batches_do_not_change_results() {
        let sections: Vec<_> = (0..7)
            .map(|i| section(&format!("S{}", i), &format!("Topic {} notes about item {}.", i, i * 3)))
            .collect();
        let query = Query::new("Reader", "notes about item 9");
        let one = RelevanceRanker::with_options(HashingEmbedder::new(), RankOptions::new().with_batch_size(1))
            .rank(&query, &sections)
            .unwrap();
        let many = RelevanceRanker::new(HashingEmbedder::new())
            .rank(&query, &sections)
            .unwrap();
        assert_eq!(one, many);
    }
}
