//! Fact store
//!
//! Components:
//! - Dataset: the static income-tax question/answer table
//! - Embedding: sentence embedders (Candle BERT, feature hashing)
//! - Index: embedded fact records behind an exact L2 nearest-neighbour search

pub mod dataset;
pub mod embedding;
pub mod index;

pub use dataset::{tax_facts, FactPair};
pub use embedding::{BertEmbedder, Embedder, HashingEmbedder};
pub use index::{FactIndex, FactRecord, FactStoreBuilder, Neighbor};
