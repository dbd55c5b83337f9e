// Answer composer: turns a retrieved fact (or its absence) into the final reply
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::errors::Result;
use crate::generation::TextGenerator;
use crate::rag::prompts;

/// Which prompt the composer used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComposeMode {
    /// A fact was retrieved and the model rephrased it
    Expand,
    /// Nothing was retrieved; the model replied conversationally
    OutOfScope,
}

impl ComposeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeMode::Expand => "expand",
            ComposeMode::OutOfScope => "out_of_scope",
        }
    }
}

/// Composer output. `text` is always displayable; on failure it carries the
/// error message and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposedAnswer {
    pub mode: ComposeMode,
    pub text: String,
    pub error: Option<String>,
}

impl ComposedAnswer {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Render an error the way the chat shows it
pub fn error_message(error: &impl std::fmt::Display) -> String {
    format!("An error occurred: {}", error)
}

pub struct AnswerComposer {
    generator: Arc<dyn TextGenerator>,
}

impl AnswerComposer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Compose the final reply. Never fails: generator errors become the text.
    ///
    /// A blank retrieved answer counts as no answer.
    pub async fn compose(&self, query: &str, retrieved_answer: Option<&str>) -> ComposedAnswer {
        let retrieved_answer = retrieved_answer.filter(|answer| !answer.trim().is_empty());
        let mode = if retrieved_answer.is_some() {
            ComposeMode::Expand
        } else {
            ComposeMode::OutOfScope
        };

        match self.try_compose(query, retrieved_answer).await {
            Ok(text) => ComposedAnswer {
                mode,
                text,
                error: None,
            },
            Err(e) => {
                warn!(mode = mode.as_str(), error = %e, "Composition failed");
                ComposedAnswer {
                    mode,
                    text: error_message(&e),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Compose and surface the raw error
    pub async fn try_compose(&self, query: &str, retrieved_answer: Option<&str>) -> Result<String> {
        let prompt = match retrieved_answer {
            Some(answer) => prompts::expand_prompt(query, answer),
            None => prompts::out_of_scope_prompt(query),
        };
        self.generator.generate(&prompt).await
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }
}
