//! Financial document analysis
//! Turns extracted document text into a category/field report via the generator

pub mod document;

pub use document::{AnalysisOutcome, DocumentAnalyzer};
