//! Text embedding seam.
//!
//! The ranker only needs a function from texts to fixed-length, L2-normalized
//! vectors. [`Embedder`] is that seam; model-backed embedders plug in here and
//! are passed to the ranker by reference, so a loaded model is created once by
//! the caller and reused for every query.

use crc32fast::Hasher as Crc32Hasher;

use crate::error::Result;

/// Default embedding dimension.
pub const DEFAULT_DIMENSION: usize = 384;

/// Text embedding backend.
pub trait Embedder {
    /// Length of every produced vector.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, one unit-length vector per text in input order.
    ///
    /// Identical texts must produce identical vectors.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text])?;
        vectors.pop().ok_or_else(|| {
            crate::error::Error::Embedding("embedder returned no vector".to_string())
        })
    }
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts)
    }
}

/// Deterministic feature-hashing embedder.
///
/// Lowercase word unigrams and adjacent-word bigrams are hashed with CRC32 into
/// `dimension` buckets; the top hash bit picks the sign. The sum is
/// L2-normalized. Texts sharing vocabulary land close together, which is enough
/// for lexical relevance ranking without a model download.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder with the default dimension.
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_DIMENSION)
    }

    /// Create an embedder with a custom dimension (at least 1).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let words = tokenize(text);

        for word in &words {
            self.add_feature(&mut vector, word.as_bytes(), 1.0);
        }
        for pair in words.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, bigram.as_bytes(), 0.5);
        }

        l2_normalize(&mut vector);
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let mut hasher = Crc32Hasher::new();
        hasher.update(feature);
        let hash = hasher.finalize();

        let bucket = (hash & 0x7FFF_FFFF) as usize % self.dimension;
        let sign = if hash & 0x8000_0000 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for HashingEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Lowercase alphanumeric word tokens.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Scale to unit length; the zero vector stays zero.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let embedder = HashingEmbedder::new();
        let vectors = embedder
            .embed_batch(&["Travel planning for college friends", "Budget hotels"])
            .unwrap();
        assert_eq!(vectors.len(), 2);
        for v in &vectors {
            assert_eq!(v.len(), DEFAULT_DIMENSION);
            assert!((norm(v) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = HashingEmbedder::new().embed("  ...  ").unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashingEmbedder::with_dimension(64);
        assert_eq!(
            embedder.embed("Nightlife and bars").unwrap(),
            embedder.embed("Nightlife and bars").unwrap()
        );
    }

    #[test]
    fn test_case_insensitive() {
        let embedder = HashingEmbedder::new();
        assert_eq!(
            embedder.embed("Coastal Adventures").unwrap(),
            embedder.embed("coastal adventures").unwrap()
        );
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::new();
        let query = embedder.embed("vegetarian dinner recipes").unwrap();
        let related = embedder.embed("easy vegetarian recipes for dinner").unwrap();
        let unrelated = embedder.embed("quarterly tax filing deadlines").unwrap();

        let dot = |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Hello, World! x_1"), vec!["hello", "world", "x_1"]);
        assert!(tokenize("--").is_empty());
    }
}
