//! Retry policy with capped exponential backoff
//!
//! - Attempts: bounded (default 3, counting the first call)
//! - Delay before retry n: base * 2^(n-1), capped at max_delay
//! - Jitter: optional ±25%
//! - Only transient errors are retried

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use super::TextGenerator;
use crate::errors::{BuddyError, Result};

/// Default attempt budget, first call included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (1 second)
const BASE_DELAY_MS: u64 = 1000;

/// Maximum delay cap (8 seconds)
const MAX_DELAY_MS: u64 = 8000;

/// Backoff policy injected into service-call wrappers
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,

    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,

    /// Randomize delays by ±25%
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
            max_delay: Duration::from_millis(MAX_DELAY_MS),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with explicit settings
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration, jitter: bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            jitter,
        }
    }

    /// Zero-delay policy, for tests and scripted runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO, false)
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::immediate(1)
    }

    /// Delay to wait before retry number `retry` (1-based), without jitter
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Delay with jitter applied if enabled
    pub fn delay_for(&self, retry: u32) -> Duration {
        let delay = self.backoff(retry);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let factor = 1.0 + (rand::random::<f64>() * 0.5 - 0.25);
        delay.mul_f64(factor)
    }

    /// Upper bound on total time spent sleeping between attempts
    pub fn max_total_wait(&self) -> Duration {
        (1..self.max_attempts).map(|retry| self.backoff(retry)).sum()
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of attempts
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(BuddyError::RetriesExhausted {
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient failure, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// A generator whose calls go through a retry policy
pub struct ResilientGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> ResilientGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for ResilientGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.policy.execute(|| self.inner.generate(prompt)).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
