//! Ollama API client
//!
//! Non-streaming text generation against a local Ollama server:
//! - Endpoint: POST /api/generate with `stream: false`
//! - Every request is bounded by the client timeout

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{GenerationOptions, TextGenerator};
use crate::errors::{BuddyError, Result};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Request timeout (30 seconds)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ollama generation client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    options: GenerationOptions,
    timeout: Duration,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        Self::with_timeout(base_url, model, REQUEST_TIMEOUT)
    }

    /// Create Ollama client with a custom request timeout
    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BuddyError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            options: GenerationOptions::default(),
            timeout,
        })
    }

    /// Attach sampling options to every request
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Generate a complete response for `prompt`
    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: if self.options.is_empty() { None } else { Some(&self.options) },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let parsed: OllamaGenerateResponse = serde_json::from_str(&body)
            .map_err(|e| BuddyError::MalformedOutput(format!("generate response: {}", e)))?;

        debug!(
            model = %self.model,
            chars = parsed.response.len(),
            eval_count = parsed.eval_count.unwrap_or(0),
            "Generation complete"
        );
        Ok(parsed.response)
    }

    fn classify_send_error(&self, error: reqwest::Error) -> BuddyError {
        if error.is_timeout() {
            BuddyError::Timeout {
                duration_ms: self.timeout.as_millis() as u64,
            }
        } else {
            BuddyError::GenerationError(format!("Failed to send request: {}", error))
        }
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BuddyError::GenerationError(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(classify_status(
                response.status(),
                "Failed to retrieve model list".to_string(),
            ));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| BuddyError::MalformedOutput(format!("Failed to parse models: {}", e)))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|m| m.name)
            .collect())
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_text(prompt).await
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Rate limits and server faults are worth retrying; other 4xx are not
fn classify_status(status: StatusCode, body: String) -> BuddyError {
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        BuddyError::GenerationError(format!("HTTP {}: {}", status, body))
    } else {
        BuddyError::GenerationRejected {
            status: status.as_u16(),
            message: body,
        }
    }
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a GenerationOptions>,
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_client_with_config_trims_slash() {
        let client = OllamaClient::with_config("http://localhost:11434/", "llama3.1:8b").unwrap();
        assert_eq!(client.model(), "llama3.1:8b");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, String::new()).is_transient());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());

        let err = classify_status(StatusCode::NOT_FOUND, "model not found".to_string());
        assert!(!err.is_transient());
        assert!(matches!(err, BuddyError::GenerationRejected { status: 404, .. }));
    }

    #[test]
    fn test_request_serialization() {
        let options = GenerationOptions {
            temperature: Some(0.3),
            max_tokens: None,
        };
        let request = OllamaGenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            options: Some(&options),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"model":"m","response":"Hello","done":true,"eval_count":3}"#;
        let parsed: OllamaGenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response, "Hello");
        assert_eq!(parsed.eval_count, Some(3));
    }

    #[tokio::test]
    #[ignore] // Requires Ollama running
    async fn test_generate_integration() {
        let client = OllamaClient::new().unwrap();
        let text = client.generate("Say hello in one word.").await.unwrap();
        assert!(!text.is_empty());
    }
}
