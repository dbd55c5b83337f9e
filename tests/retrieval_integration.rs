//! Retrieval over the full fact table with the offline hashing embedder

mod common;

use quickcheck_macros::quickcheck;
use std::sync::Arc;

use taxbuddy::knowledge::{tax_facts, FactIndex, FactStoreBuilder};
use taxbuddy::rag::Retriever;

fn retriever() -> Retriever {
    let embedder = common::hashing_embedder();
    let index = FactStoreBuilder::new(embedder.clone())
        .build(&tax_facts())
        .unwrap();
    Retriever::new(embedder, Arc::new(index))
}

#[test]
fn test_index_holds_every_fact_in_order() {
    let retriever = retriever();
    let facts = tax_facts();
    assert_eq!(retriever.index().len(), 13);

    for (row, fact) in facts.iter().enumerate() {
        let record = retriever.index().get(row).unwrap();
        assert_eq!(record.question, fact.question);
        assert_eq!(record.answer, fact.answer);
    }
}

#[test]
fn test_every_stored_question_retrieves_its_own_answer() {
    let retriever = retriever();
    for (row, fact) in tax_facts().iter().enumerate() {
        let hit = retriever.retrieve(&fact.question).unwrap().unwrap();
        assert_eq!(hit.row, row, "question {:?} matched row {}", fact.question, hit.row);
        assert_eq!(hit.answer, fact.answer);
    }
}

#[test]
fn test_paraphrased_questions() {
    let retriever = retriever();
    let cases = [
        ("Is the new tax regime mandatory?", 11),
        ("What is the standard deduction under the new tax regime?", 5),
        ("What is the rebate under Section 87A?", 9),
        ("How do I choose between the old and new regimes?", 12),
        ("highest surcharge rate", 4),
    ];

    for (query, expected) in cases {
        let hit = retriever.retrieve(query).unwrap().unwrap();
        assert_eq!(hit.row, expected, "query {:?}", query);
    }
}

#[test]
fn test_mandatory_answer_text() {
    let answer = retriever()
        .retrieve_answer("Is the new tax regime mandatory?")
        .unwrap()
        .unwrap();
    assert!(answer.starts_with("No"));
}

#[test]
fn test_off_topic_query_still_matches_without_cutoff() {
    let hit = retriever().retrieve("What's the weather like today?").unwrap();
    assert!(hit.is_some());
}

#[test]
fn test_off_topic_query_misses_with_cutoff() {
    let retriever = retriever().with_max_distance(Some(1.0));
    assert!(retriever.retrieve("What's the weather like today?").unwrap().is_none());
    assert!(retriever.retrieve("Is the new tax regime mandatory?").unwrap().is_some());
}

#[test]
fn test_empty_index_never_matches() {
    let retriever = Retriever::new(common::hashing_embedder(), Arc::new(FactIndex::empty(384)));
    assert!(retriever.retrieve("Is the new tax regime mandatory?").unwrap().is_none());
}

#[quickcheck]
fn prop_retrieval_is_deterministic(query: String) -> bool {
    let retriever = retriever();
    let first = retriever.retrieve(&query).unwrap();
    let second = retriever.retrieve(&query).unwrap();
    first == second
}

#[quickcheck]
fn prop_without_cutoff_nonempty_index_always_matches(query: String) -> bool {
    retriever().retrieve(&query).unwrap().is_some()
}
