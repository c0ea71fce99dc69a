//! Relevance ranking of sections against a persona/task query.

mod embedder;
#[cfg(feature = "model")]
mod minilm;
mod ranker;
mod refine;

pub use embedder::{l2_normalize, Embedder, HashingEmbedder, DEFAULT_DIMENSION};
#[cfg(feature = "model")]
pub use minilm::{MiniLmEmbedder, DEFAULT_MODEL_ID};
pub use ranker::{cosine_similarity, CandidateSection, RankOptions, Ranking, RelevanceRanker};
pub use refine::{RefineLimits, Refiner};
