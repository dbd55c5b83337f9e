//! Configuration for TaxBuddy
//!
//! TOML file at `~/.taxbuddy/config.toml`, created with defaults on first
//! load. Every section and key is optional in the file.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::BuddyError;
use crate::generation::retry::RetryPolicy;
use crate::generation::GenerationOptions;

const APP_DIR: &str = ".taxbuddy";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub generation: GenerationConfig,
    pub retry: RetryConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

/// Text-generation service connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence-transformer model run locally with candle
    Bert,
    /// Feature hashing, no model download
    Hashing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model_id: String,
    /// Vector width for the hashing backend
    pub dimension: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Squared L2 distance above which the nearest fact is treated as a miss
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f32>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "qwen2.5:7b-instruct".to_string(),
            timeout_secs: 30,
            temperature: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            jitter: true,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Bert,
            model_id: crate::knowledge::embedding::DEFAULT_MODEL_ID.to_string(),
            dimension: 384,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location.
    ///
    /// An explicit path must exist. The default file is written with
    /// defaults when missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    return Self::load_from_file(&path);
                }
                let config = Config::default();
                if let Err(e) = config.save(&path) {
                    warn!(error = %e, "Could not write default config");
                }
                Ok(config)
            }
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, toml_string).context("Failed to write config file")?;
        Ok(())
    }

    /// `~/.taxbuddy/config.toml`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    /// `~/.taxbuddy/history`
    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("history"))
    }

    fn app_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(APP_DIR))
    }

    pub fn validate(&self) -> std::result::Result<(), BuddyError> {
        if self.generation.model.trim().is_empty() {
            return Err(BuddyError::ConfigError("generation.model must not be empty".to_string()));
        }

        if reqwest::Url::parse(&self.generation.base_url).is_err() {
            return Err(BuddyError::ConfigError(format!(
                "generation.base_url is not a valid URL: {}",
                self.generation.base_url
            )));
        }

        if self.generation.timeout_secs == 0 {
            return Err(BuddyError::ConfigError(
                "generation.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(BuddyError::ConfigError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(BuddyError::ConfigError(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(BuddyError::ConfigError(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        if let Some(cutoff) = self.retrieval.max_distance {
            if !cutoff.is_finite() || cutoff < 0.0 {
                return Err(BuddyError::ConfigError(
                    "retrieval.max_distance must be a non-negative number".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.max_delay_ms),
            self.retry.jitter,
        )
    }

    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.generation.temperature,
            max_tokens: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_secs)
    }

    /// Replace host and/or port in `generation.base_url`
    pub fn set_endpoint(&mut self, host: Option<&str>, port: Option<u16>) -> std::result::Result<(), BuddyError> {
        if host.is_none() && port.is_none() {
            return Ok(());
        }

        let mut url = reqwest::Url::parse(&self.generation.base_url)
            .map_err(|e| BuddyError::ConfigError(format!("Invalid base_url: {}", e)))?;
        if let Some(host) = host {
            url.set_host(Some(host))
                .map_err(|e| BuddyError::ConfigError(format!("Invalid host '{}': {}", host, e)))?;
        }
        if let Some(port) = port {
            url.set_port(Some(port))
                .map_err(|_| BuddyError::ConfigError(format!("Cannot set port {}", port)))?;
        }

        self.generation.base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(())
    }
}
