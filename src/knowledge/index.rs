// Fact store: embedded question/answer records behind an exact L2 index
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::errors::{BuddyError, Result};
use crate::knowledge::dataset::FactPair;
use crate::knowledge::embedding::Embedder;

/// One embedded fact. Never mutated after the index is built.
#[derive(Debug, Clone, Serialize)]
pub struct FactRecord {
    pub question: String,
    pub answer: String,
    pub embedding: Vec<f32>,
}

/// A search result: row position in the index plus squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f32,
}

/// Exact nearest-neighbour index over fact embeddings
///
/// Rows are the dataset order. All vectors share `dimension`.
#[derive(Debug, Clone)]
pub struct FactIndex {
    records: Vec<FactRecord>,
    dimension: usize,
}

impl FactIndex {
    /// An index with no facts; every search comes back empty
    pub fn empty(dimension: usize) -> Self {
        Self {
            records: Vec::new(),
            dimension,
        }
    }

    fn from_records(records: Vec<FactRecord>, dimension: usize) -> Result<Self> {
        for record in &records {
            if record.embedding.len() != dimension {
                return Err(BuddyError::DimensionMismatch {
                    expected: dimension,
                    actual: record.embedding.len(),
                });
            }
        }
        Ok(Self { records, dimension })
    }

    /// Return up to `k` rows ordered by ascending squared L2 distance.
    /// Equal distances keep the lower row first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(BuddyError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .records
            .iter()
            .enumerate()
            .map(|(row, record)| Neighbor {
                row,
                distance: squared_l2(query, &record.embedding),
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.row.cmp(&b.row)));
        neighbors.truncate(k);
        Ok(neighbors)
    }

    pub fn get(&self, row: usize) -> Option<&FactRecord> {
        self.records.get(row)
    }

    pub fn records(&self) -> &[FactRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Squared Euclidean distance, the metric a flat L2 index reports
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Builds a `FactIndex` from question/answer pairs
///
/// Runs once at startup. Any failure here is a configuration error and the
/// caller must not start serving.
pub struct FactStoreBuilder {
    embedder: Arc<dyn Embedder>,
}

impl FactStoreBuilder {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub fn build(&self, facts: &[FactPair]) -> Result<FactIndex> {
        if facts.is_empty() {
            return Err(BuddyError::EmptyDataset);
        }

        let contexts: Vec<String> = facts.iter().map(FactPair::context).collect();
        let context_refs: Vec<&str> = contexts.iter().map(String::as_str).collect();

        let embeddings = self.embedder.embed_batch(&context_refs)?;
        if embeddings.len() != facts.len() {
            return Err(BuddyError::EmbeddingError(format!(
                "expected {} embeddings, got {}",
                facts.len(),
                embeddings.len()
            )));
        }

        let records = facts
            .iter()
            .zip(embeddings)
            .map(|(fact, embedding)| FactRecord {
                question: fact.question.clone(),
                answer: fact.answer.clone(),
                embedding,
            })
            .collect();

        let index = FactIndex::from_records(records, self.embedder.dimension())?;

        info!(
            facts = index.len(),
            dimension = index.dimension(),
            embedder = self.embedder.name(),
            "Built fact index"
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::embedding::HashingEmbedder;

    /// Embedder that lies about its width
    struct WrongWidth;

    impl Embedder for WrongWidth {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
        }
        fn dimension(&self) -> usize {
            4
        }
        fn name(&self) -> &str {
            "wrong-width"
        }
    }

    fn pairs() -> Vec<FactPair> {
        vec![
            FactPair::new("What is the standard deduction?", "Rs 75,000."),
            FactPair::new("Is the new regime mandatory?", "No."),
        ]
    }

    #[test]
    fn test_build_preserves_order_and_size() {
        let builder = FactStoreBuilder::new(Arc::new(HashingEmbedder::default()));
        let index = builder.build(&pairs()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(1).unwrap().answer, "No.");
        assert!(index.records().iter().all(|r| r.embedding.len() == index.dimension()));
    }

    #[test]
    fn test_build_empty_dataset_fails() {
        let builder = FactStoreBuilder::new(Arc::new(HashingEmbedder::default()));
        let err = builder.build(&[]).unwrap_err();
        assert!(matches!(err, BuddyError::EmptyDataset));
    }

    #[test]
    fn test_build_dimension_mismatch_fails() {
        let builder = FactStoreBuilder::new(Arc::new(WrongWidth));
        let err = builder.build(&pairs()).unwrap_err();
        assert!(matches!(err, BuddyError::DimensionMismatch { expected: 4, actual: 3 }));
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = FactIndex::from_records(
            vec![
                FactRecord { question: "a".into(), answer: "A".into(), embedding: vec![1.0, 0.0] },
                FactRecord { question: "b".into(), answer: "B".into(), embedding: vec![0.0, 1.0] },
                FactRecord { question: "c".into(), answer: "C".into(), embedding: vec![0.9, 0.1] },
            ],
            2,
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].row, 0);
        assert_eq!(hits[0].distance, 0.0);
        assert_eq!(hits[1].row, 2);
    }

    #[test]
    fn test_search_tie_prefers_lower_row() {
        let index = FactIndex::from_records(
            vec![
                FactRecord { question: "a".into(), answer: "A".into(), embedding: vec![0.0, 1.0] },
                FactRecord { question: "b".into(), answer: "B".into(), embedding: vec![0.0, -1.0] },
            ],
            2,
        )
        .unwrap();

        let hits = index.search(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits[0].row, 0);
    }

    #[test]
    fn test_search_empty_index() {
        let index = FactIndex::empty(8);
        assert!(index.search(&[0.0; 8], 1).unwrap().is_empty());
    }

    #[test]
    fn test_search_rejects_wrong_query_width() {
        let index = FactIndex::empty(8);
        assert!(matches!(
            index.search(&[0.0; 4], 1),
            Err(BuddyError::DimensionMismatch { expected: 8, actual: 4 })
        ));
    }

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }
}
