// Document analysis: ask the model for key figures as JSON, parse into a report
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::BuddyError;
use crate::extract::report::FinancialReport;
use crate::extract::structured;
use crate::generation::TextGenerator;
use crate::rag::composer::error_message;

/// Categories the model is asked to fill
pub const CATEGORIES: [&str; 3] = ["Income Statement", "Balance Sheet", "Cash Flow"];

/// Shown when the model's reply is not usable JSON
pub const UNPARSED_MESSAGE: &str = "Could not interpret response";

/// Documents longer than this are cut before prompting
pub const DEFAULT_MAX_CHARS: usize = 12_000;

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Report(FinancialReport),
    /// The model answered but not in the expected shape
    Unparsed { message: String, raw: String },
    /// The generator failed or the input was unusable
    Failed(String),
}

impl AnalysisOutcome {
    pub fn report(&self) -> Option<&FinancialReport> {
        match self {
            AnalysisOutcome::Report(report) => Some(report),
            _ => None,
        }
    }
}

pub struct DocumentAnalyzer {
    generator: Arc<dyn TextGenerator>,
    max_chars: usize,
}

impl DocumentAnalyzer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars.max(1);
        self
    }

    /// Analyze already-extracted document text
    pub async fn analyze(&self, text: &str) -> AnalysisOutcome {
        let text = text.trim();
        if text.is_empty() {
            return AnalysisOutcome::Failed("Document is empty".to_string());
        }

        let prompt = analysis_prompt(truncate_chars(text, self.max_chars));
        let raw = match self.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Document analysis failed");
                return AnalysisOutcome::Failed(error_message(&e));
            }
        };

        match structured::parse_value(&raw).and_then(|value| FinancialReport::from_json(&value)) {
            Ok(report) => {
                debug!(fields = report.field_count(), "Parsed financial report");
                AnalysisOutcome::Report(report)
            }
            Err(BuddyError::MalformedOutput(reason)) => {
                debug!(%reason, "Model output was not a report");
                AnalysisOutcome::Unparsed {
                    message: UNPARSED_MESSAGE.to_string(),
                    raw,
                }
            }
            Err(e) => AnalysisOutcome::Failed(error_message(&e)),
        }
    }
}

/// Prompt asking for a JSON object keyed by [`CATEGORIES`]
pub fn analysis_prompt(document: &str) -> String {
    let keys = CATEGORIES
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "You are a financial analyst. Extract the key financial figures from the document below.\n\
         Respond only with a JSON object whose keys are {keys}.\n\
         Each key maps field names to numeric values. Use \"N/A\" when a value is not present.\n\
         \n\
         Document:\n\
         {document}\n"
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
