//! Feature-hashing embedder
//!
//! Deterministic and offline: lower-cased alphanumeric unigrams and bigrams are
//! hashed (FNV-1a, 64 bit) into a fixed number of buckets with a sign taken from
//! the top hash bit, then the vector is L2-normalized. Each distinct feature
//! counts once per text.

use std::collections::BTreeSet;

use super::{l2_normalize, Embedder};
use crate::errors::{BuddyError, Result};

/// Same width as MiniLM so configs can swap backends freely
pub const DEFAULT_DIMENSION: usize = 384;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(BuddyError::ConfigError(
                "hashing embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn features(text: &str) -> BTreeSet<String> {
        let tokens = tokenize(text);
        let mut features: BTreeSet<String> = tokens.iter().cloned().collect();
        for pair in tokens.windows(2) {
            features.insert(format!("{} {}", pair[0], pair[1]));
        }
        features
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for feature in Self::features(text) {
            let hash = fnv1a(feature.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimension: DEFAULT_DIMENSION }
    }
}

impl Embedder for HashingEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Split on anything that is not alphanumeric and lower-case the pieces
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_lowercase())
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
