//! TaxBuddy - income-tax chatbot over a fixed fact table
//!
//! A query is embedded, matched to its nearest stored fact, and rewritten by a
//! local Ollama model into a friendly answer. Queries with no match get a
//! polite out-of-scope reply.
//!
//! # Architecture
//!
//! - **knowledge**: fact table, embedders, exact L2 index
//! - **generation**: text-generation seam, Ollama client, retry policy
//! - **rag**: retriever, prompt templates, answer composer, turn pipeline
//! - **session**: transcript and per-turn state machine
//! - **extract** / **analysis**: tolerant JSON parsing, figure extraction,
//!   document reports

pub mod errors;
pub use errors::{BuddyError, Result};

pub mod knowledge;
pub mod generation;
pub mod rag;
pub mod session;

pub mod extract;
pub mod analysis;

// Interface layer
pub mod cli;
pub mod config;
pub mod doctor;
pub mod repl;
pub mod telemetry;
