//! Error types for TaxBuddy
//!
//! One error enum for the whole pipeline. Startup failures (dataset, embedding,
//! index) are fatal; everything raised while serving a turn is converted into a
//! displayable message by the pipeline.

use thiserror::Error;

/// Main error type for the TaxBuddy pipeline
#[derive(Error, Debug)]
pub enum BuddyError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Fact store was asked to build from nothing
    #[error("Configuration error: fact dataset is empty")]
    EmptyDataset,

    /// Vector width disagrees with the index
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    /// Transient generation service errors (network, rate limit, 5xx)
    #[error("Generation service error: {0}")]
    GenerationError(String),

    /// Permanent generation service errors (auth, invalid request)
    #[error("Generation request rejected (HTTP {status}): {message}")]
    GenerationRejected { status: u16, message: String },

    /// Retry budget spent
    #[error("Generation failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Service returned something we could not decode
    #[error("Could not interpret response: {0}")]
    MalformedOutput(String),

    /// Turn state machine errors
    #[error("Invalid turn transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

impl BuddyError {
    /// Whether a retry has a chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            BuddyError::GenerationError(_) => true,
            BuddyError::Timeout { .. } => true,
            BuddyError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),

            BuddyError::GenerationRejected { .. } => false,
            BuddyError::RetriesExhausted { .. } => false,
            BuddyError::MalformedOutput(_) => false,
            BuddyError::ConfigError(_) => false,
            BuddyError::EmptyDataset => false,
            BuddyError::DimensionMismatch { .. } => false,
            BuddyError::EmbeddingError(_) => false,
            BuddyError::InvalidTransition { .. } => false,
            BuddyError::SerializationError(_) => false,
            BuddyError::IoError(_) => false,
            BuddyError::Generic(_) => false,
        }
    }

    /// Whether this error belongs to the fatal startup family
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BuddyError::ConfigError(_)
                | BuddyError::EmptyDataset
                | BuddyError::DimensionMismatch { .. }
                | BuddyError::EmbeddingError(_)
        )
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BuddyError>;

/// Convert anyhow errors to BuddyError
impl From<anyhow::Error> for BuddyError {
    fn from(err: anyhow::Error) -> Self {
        BuddyError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BuddyError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(BuddyError::GenerationError("503".to_string()).is_transient());
        assert!(BuddyError::Timeout { duration_ms: 30_000 }.is_transient());
        assert!(!BuddyError::GenerationRejected {
            status: 401,
            message: "unauthorized".to_string(),
        }
        .is_transient());
        assert!(!BuddyError::MalformedOutput("eof".to_string()).is_transient());
    }

    #[test]
    fn test_configuration_family() {
        assert!(BuddyError::EmptyDataset.is_configuration());
        assert!(BuddyError::EmbeddingError("no weights".to_string()).is_configuration());
        assert!(!BuddyError::GenerationError("x".to_string()).is_configuration());
    }

    #[test]
    fn test_empty_dataset_mentions_configuration() {
        assert!(BuddyError::EmptyDataset.to_string().starts_with("Configuration error"));
    }
}
