// Shared generators for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use taxbuddy::generation::TextGenerator;
use taxbuddy::knowledge::{tax_facts, Embedder, HashingEmbedder};
use taxbuddy::rag::ChatPipeline;
use taxbuddy::{BuddyError, Result};

/// Answers every prompt with a fixed prefix plus the prompt length, and keeps
/// the prompts it saw
#[derive(Default)]
pub struct ScriptedGenerator {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(format!("Here is a friendly explanation ({} chars of context).", prompt.len()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Always fails with the given error text
pub struct FailingGenerator {
    pub message: String,
    pub transient: bool,
}

impl FailingGenerator {
    pub fn permanent(message: &str) -> Self {
        Self { message: message.to_string(), transient: false }
    }

    pub fn transient(message: &str) -> Self {
        Self { message: message.to_string(), transient: true }
    }
}

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        if self.transient {
            Err(BuddyError::GenerationError(self.message.clone()))
        } else {
            Err(BuddyError::GenerationRejected {
                status: 400,
                message: self.message.clone(),
            })
        }
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Fails transiently `failures` times, then succeeds. Counts every call.
pub struct FlakyGenerator {
    failures: usize,
    calls: AtomicUsize,
}

impl FlakyGenerator {
    pub fn new(failures: usize) -> Self {
        Self { failures, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FlakyGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(BuddyError::GenerationError("503 Service Unavailable".to_string()))
        } else {
            Ok("Recovered answer".to_string())
        }
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

pub fn hashing_embedder() -> Arc<dyn Embedder> {
    Arc::new(HashingEmbedder::default())
}

/// Pipeline over the full fact table with the hashing embedder
pub fn pipeline_with(generator: Arc<dyn TextGenerator>) -> ChatPipeline {
    ChatPipeline::build(&tax_facts(), hashing_embedder(), generator, None).unwrap()
}
