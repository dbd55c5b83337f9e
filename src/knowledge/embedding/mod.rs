//! Sentence embedding backends
//!
//! Both the fact store and the retriever must embed through the same
//! `Embedder`; distances between vectors from different models mean nothing.

pub mod engine;
pub mod hashing;

pub use engine::{BertEmbedder, DEFAULT_MODEL_ID};
pub use hashing::HashingEmbedder;

use crate::errors::{BuddyError, Result};

/// Turns text into fixed-width vectors
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in order
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Output width of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Short identifier for logs
    fn name(&self) -> &str;

    /// Embed a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| BuddyError::EmbeddingError("embedder returned no vector".to_string()))
    }
}

/// Scale a vector to unit length in place. Zero vectors are left alone.
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

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0; 4];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }
}
