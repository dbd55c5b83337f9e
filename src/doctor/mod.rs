//! Doctor command for system diagnostics
//!
//! Health checks for the generation service, the configured model and the
//! local fact index.

use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::generation::OllamaClient;
use crate::knowledge::dataset::tax_facts;
use crate::knowledge::embedding::{Embedder, HashingEmbedder};
use crate::knowledge::index::FactStoreBuilder;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor {
    client: OllamaClient,
    config_dir: Option<PathBuf>,
}

impl Doctor {
    pub fn new(client: OllamaClient, config_dir: Option<PathBuf>) -> Self {
        Self { client, config_dir }
    }

    pub fn from_config(config: &Config) -> crate::errors::Result<Self> {
        let client = OllamaClient::with_timeout(
            &config.generation.base_url,
            &config.generation.model,
            std::time::Duration::from_secs(5),
        )?;
        let config_dir = Config::config_path()
            .ok()
            .and_then(|p| p.parent().map(|d| d.to_path_buf()));
        Ok(Self::new(client, config_dir))
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        let reachable = self.check_ollama_api().await;
        let api_ok = reachable.status == HealthStatus::Pass;
        checks.push(reachable);

        if api_ok {
            checks.push(self.check_model_available().await);
        } else {
            checks.push(HealthCheck::new(
                "Model",
                HealthStatus::Fail("Skipped: Ollama not reachable".to_string()),
            ));
        }

        checks.push(check_fact_index());
        checks.push(self.check_config_dir());
        checks
    }

    async fn check_ollama_api(&self) -> HealthCheck {
        match self.client.health_check().await {
            Ok(true) => HealthCheck::new("Ollama API", HealthStatus::Pass),
            Ok(false) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!(
                    "Not reachable at {} (start it with: ollama serve)",
                    self.client.base_url()
                )),
            ),
            Err(e) => HealthCheck::new(
                "Ollama API",
                HealthStatus::Fail(format!("Error checking Ollama: {}", e)),
            ),
        }
    }

    async fn check_model_available(&self) -> HealthCheck {
        match self.client.list_models().await {
            Ok(models) => HealthCheck::new("Model", model_status(&models, self.client.model())),
            Err(e) => HealthCheck::new(
                "Model",
                HealthStatus::Fail(format!("Cannot list models: {}", e)),
            ),
        }
    }

    fn check_config_dir(&self) -> HealthCheck {
        let Some(dir) = &self.config_dir else {
            return HealthCheck::new(
                "Config Dir",
                HealthStatus::Warn("Could not determine home directory".to_string()),
            );
        };

        match std::fs::create_dir_all(dir) {
            Ok(()) => HealthCheck::new("Config Dir", HealthStatus::Pass),
            Err(e) => HealthCheck::new(
                "Config Dir",
                HealthStatus::Warn(format!("{} not writable: {}", dir.display(), e)),
            ),
        }
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n{}\n", "TaxBuddy System Diagnostics".bold().cyan());
        println!("{:<20} {}", "Check", "Status");
        println!("{}", "=".repeat(50));

        for check in checks {
            let message = match &check.status {
                HealthStatus::Pass => "PASS".green(),
                HealthStatus::Warn(msg) => format!("WARN: {}", msg).yellow(),
                HealthStatus::Fail(msg) => format!("FAIL: {}", msg).red(),
            };
            println!("{:<20} {}", check.name, message);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks.iter().any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

/// Is `wanted` among the installed models? A name without a tag matches `:latest`.
fn model_status(installed: &[String], wanted: &str) -> HealthStatus {
    let found = installed.iter().any(|name| {
        name == wanted || (!wanted.contains(':') && *name == format!("{}:latest", wanted))
    });

    if found {
        HealthStatus::Pass
    } else if installed.is_empty() {
        HealthStatus::Fail(format!("No models installed (run: ollama pull {})", wanted))
    } else {
        HealthStatus::Fail(format!("{} not installed (run: ollama pull {})", wanted, wanted))
    }
}

/// Build the fact index with the hashing embedder to catch dataset problems
/// without downloading a model
fn check_fact_index() -> HealthCheck {
    let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::default());
    match FactStoreBuilder::new(embedder).build(&tax_facts()) {
        Ok(index) => HealthCheck::new(
            "Fact Index",
            if index.is_empty() {
                HealthStatus::Warn("No facts loaded".to_string())
            } else {
                HealthStatus::Pass
            },
        ),
        Err(e) => HealthCheck::new("Fact Index", HealthStatus::Fail(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_status() {
        let installed = vec!["qwen2.5:7b-instruct".to_string(), "llama3:latest".to_string()];
        assert_eq!(model_status(&installed, "qwen2.5:7b-instruct"), HealthStatus::Pass);
        assert_eq!(model_status(&installed, "llama3"), HealthStatus::Pass);
        assert!(matches!(model_status(&installed, "mistral"), HealthStatus::Fail(_)));
        assert!(matches!(model_status(&[], "llama3"), HealthStatus::Fail(_)));
    }

    #[test]
    fn test_fact_index_check_passes() {
        assert_eq!(check_fact_index().status, HealthStatus::Pass);
    }

    #[test]
    fn test_overall_status() {
        let checks = vec![
            HealthCheck::new("A", HealthStatus::Pass),
            HealthCheck::new("B", HealthStatus::Warn("warning".to_string())),
        ];
        assert!(Doctor::overall_status(&checks));

        let checks = vec![
            HealthCheck::new("A", HealthStatus::Pass),
            HealthCheck::new("B", HealthStatus::Fail("error".to_string())),
        ];
        assert!(!Doctor::overall_status(&checks));
    }

    #[tokio::test]
    async fn test_unreachable_service_fails() {
        // Port 9 (discard) is not an Ollama server
        let client = OllamaClient::with_timeout(
            "http://127.0.0.1:9",
            "llama3",
            std::time::Duration::from_millis(500),
        )
        .unwrap();
        let doctor = Doctor::new(client, None);

        let checks = doctor.run_diagnostics().await;
        assert_eq!(checks.len(), 4);
        assert!(matches!(checks[0].status, HealthStatus::Fail(_)));
        assert!(!Doctor::overall_status(&checks));
    }
}
