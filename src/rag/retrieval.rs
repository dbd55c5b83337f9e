// Retriever: embed the query, take the single nearest fact
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::errors::Result;
use crate::knowledge::embedding::Embedder;
use crate::knowledge::index::FactIndex;

/// The fact closest to a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalHit {
    pub row: usize,
    pub question: String,
    pub answer: String,
    /// Squared L2 distance between query and fact context embeddings
    pub distance: f32,
}

/// k=1 nearest-fact lookup
///
/// The embedder must be the one the index was built with.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<FactIndex>,
    max_distance: Option<f32>,
}

impl Retriever {
    /// Always-match retriever: any non-empty index yields a hit
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<FactIndex>) -> Self {
        Self {
            embedder,
            index,
            max_distance: None,
        }
    }

    /// Reject hits farther than `max_distance`
    pub fn with_max_distance(mut self, max_distance: Option<f32>) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Nearest fact for `query`, or `None` for an empty index (or a hit past
    /// the distance cutoff, when one is set)
    pub fn retrieve(&self, query: &str) -> Result<Option<RetrievalHit>> {
        if self.index.is_empty() {
            debug!("Fact index is empty, no match");
            return Ok(None);
        }

        let query_embedding = self.embedder.embed(query)?;
        let nearest = self.index.search(&query_embedding, 1)?;

        let Some(neighbor) = nearest.first().copied() else {
            return Ok(None);
        };

        if let Some(cutoff) = self.max_distance {
            if neighbor.distance > cutoff {
                debug!(row = neighbor.row, distance = neighbor.distance, cutoff, "Nearest fact beyond cutoff");
                return Ok(None);
            }
        }

        let Some(record) = self.index.get(neighbor.row) else {
            return Ok(None);
        };

        debug!(row = neighbor.row, distance = neighbor.distance, "Retrieved fact");
        Ok(Some(RetrievalHit {
            row: neighbor.row,
            question: record.question.clone(),
            answer: record.answer.clone(),
            distance: neighbor.distance,
        }))
    }

    /// Answer text only, the plain `retrieve` contract
    pub fn retrieve_answer(&self, query: &str) -> Result<Option<String>> {
        Ok(self.retrieve(query)?.map(|hit| hit.answer))
    }

    pub fn index(&self) -> &FactIndex {
        &self.index
    }

    pub fn max_distance(&self) -> Option<f32> {
        self.max_distance
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::dataset::FactPair;
    use crate::knowledge::embedding::HashingEmbedder;
    use crate::knowledge::index::FactStoreBuilder;

    fn retriever() -> Retriever {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let index = FactStoreBuilder::new(embedder.clone())
            .build(&[
                FactPair::new("What is the standard deduction?", "Rs 75,000."),
                FactPair::new("Is the new regime mandatory?", "No, it is the default."),
            ])
            .unwrap();
        Retriever::new(embedder, Arc::new(index))
    }

    #[test]
    fn test_exact_question_retrieves_own_answer() {
        let hit = retriever().retrieve("Is the new regime mandatory?").unwrap().unwrap();
        assert_eq!(hit.row, 1);
        assert_eq!(hit.answer, "No, it is the default.");
    }

    #[test]
    fn test_empty_index_returns_none() {
        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
        let retriever = Retriever::new(embedder, Arc::new(FactIndex::empty(384)));
        assert_eq!(retriever.retrieve_answer("anything").unwrap(), None);
    }

    #[test]
    fn test_cutoff_turns_far_hit_into_miss() {
        let retriever = retriever().with_max_distance(Some(0.0));
        assert!(retriever.retrieve("completely unrelated words").unwrap().is_none());
    }

    #[test]
    fn test_no_cutoff_always_matches() {
        let hit = retriever().retrieve("completely unrelated words").unwrap();
        assert!(hit.is_some());
    }
}
