//! Text generation service
//!
//! Provides the generator seam, the Ollama client behind it, and the retry
//! policy wrapper.

pub mod client;
pub mod retry;

pub use client::{OllamaClient, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use retry::{ResilientGenerator, RetryPolicy};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Anything that turns a prompt into text.
///
/// Calls are stateless: every piece of context must be in the prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Short identifier for logs
    fn name(&self) -> &str;
}

/// Sampling parameters forwarded to the service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(rename = "num_predict", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.max_tokens.is_none()
    }
}
