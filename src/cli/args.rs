//! Command-line argument parsing for TaxBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{Config, EmbeddingBackend};
use crate::errors::Result;

/// TaxBuddy - income-tax answers grounded in a fixed fact table
#[derive(Parser, Debug)]
#[command(name = "taxbuddy")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Ask income-tax questions, answered by a local Ollama model", long_about = None)]
pub struct Args {
    /// Question to answer once; starts the chat when omitted
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Ollama model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Ollama host
    #[arg(long)]
    pub host: Option<String>,

    /// Ollama port
    #[arg(long)]
    pub port: Option<u16>,

    /// Embedding backend
    #[arg(long, value_enum)]
    pub embedder: Option<EmbeddingBackend>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start the interactive chat
    Chat,

    /// List the fact table
    Facts,

    /// Extract key financial figures from a plain-text document
    Analyze {
        /// Text file to analyze
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Check that the Ollama service and model are reachable
    Doctor,

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// A question and a subcommand cannot be combined
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.command.is_some() && self.question.is_some() {
            return Err("Cannot specify a question with a subcommand.".to_string());
        }
        if matches!(&self.question, Some(q) if q.trim().is_empty()) {
            return Err("Question must not be empty.".to_string());
        }
        Ok(())
    }

    /// What to run. No question and no subcommand means chat.
    pub fn resolved_command(&self) -> Option<Commands> {
        match (&self.command, &self.question) {
            (Some(command), _) => Some(command.clone()),
            (None, Some(_)) => None,
            (None, None) => Some(Commands::Chat),
        }
    }

    /// Apply command-line overrides on top of the file configuration
    pub fn apply_to(&self, config: &mut Config) -> Result<()> {
        if let Some(model) = &self.model {
            config.generation.model = model.clone();
        }
        if let Some(backend) = self.embedder {
            config.embedding.backend = backend;
        }
        config.set_endpoint(self.host.as_deref(), self.port)?;
        config.validate()
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Check if should show spinners and summaries
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show retrieval details
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
