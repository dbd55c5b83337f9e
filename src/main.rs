//! TaxBuddy - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use taxbuddy::{
    analysis::{AnalysisOutcome, DocumentAnalyzer},
    cli::{Args, Commands, Verbosity},
    config::{Config, EmbeddingBackend},
    doctor::Doctor,
    generation::{OllamaClient, ResilientGenerator, TextGenerator},
    knowledge::{tax_facts, BertEmbedder, Embedder, HashingEmbedder},
    rag::ChatPipeline,
    repl::{DisplayManager, ReplSession},
    session::SessionState,
    telemetry::init_logging,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(message) = args.validate() {
        eprintln!("{} {}", "Error:".red().bold(), message);
        std::process::exit(2);
    }

    let verbosity = args.verbosity();
    init_logging(verbosity);

    let mut config = Config::load(args.config.as_deref())?;
    args.apply_to(&mut config)?;

    match args.resolved_command() {
        Some(Commands::Chat) => run_chat(&config, verbosity).await?,
        Some(Commands::Facts) => show_facts(),
        Some(Commands::Analyze { file }) => run_analyze(&config, &file, verbosity).await?,
        Some(Commands::Doctor) => run_doctor(&config).await?,
        Some(Commands::Config) => show_config(&config)?,
        None => {
            if let Some(question) = &args.question {
                ask_once(&config, question, verbosity).await?;
            }
        }
    }

    Ok(())
}

/// Interactive chat
async fn run_chat(config: &Config, verbosity: Verbosity) -> Result<()> {
    let pipeline = build_pipeline(config, verbosity).await?;

    let history_path = Config::history_path()?;
    let mut repl = ReplSession::with_history(history_path)?.with_verbosity(verbosity);

    repl.show_welcome(
        concat!("v", env!("CARGO_PKG_VERSION")),
        &config.generation.model,
        pipeline.index().len(),
    );
    repl.run(&pipeline, verbosity).await
}

/// Answer one question and exit
async fn ask_once(config: &Config, question: &str, verbosity: Verbosity) -> Result<()> {
    let pipeline = build_pipeline(config, verbosity).await?;

    let mut display = spinner_display(verbosity);
    display.start_thinking();
    let (_session, report) = pipeline.process_turn(SessionState::new(), question).await;
    display.show_answer(&report, verbosity.show_events());

    if report.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_analyze(config: &Config, file: &Path, verbosity: Verbosity) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let analyzer = DocumentAnalyzer::new(build_generator(config)?);

    let mut display = spinner_display(verbosity);
    display.start_thinking();
    let outcome = analyzer.analyze(&text).await;
    display.finish_current();

    match outcome {
        AnalysisOutcome::Report(report) => {
            display.show_report(&report);
            let missing = report.missing_fields();
            if !missing.is_empty() {
                let names: Vec<String> = missing
                    .iter()
                    .map(|(category, field)| format!("{} / {}", category, field))
                    .collect();
                display.show_info(&format!("Not found in document: {}", names.join(", ")));
            }
        }
        AnalysisOutcome::Unparsed { message, raw } => {
            display.show_warning(&message);
            println!("{}", raw);
        }
        AnalysisOutcome::Failed(message) => {
            display.show_error(&message);
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run_doctor(config: &Config) -> Result<()> {
    let doctor = Doctor::from_config(config)?;
    let checks = doctor.run_diagnostics().await;
    Doctor::display_results(&checks);

    std::process::exit(if Doctor::overall_status(&checks) { 0 } else { 1 });
}

fn show_facts() {
    let facts = tax_facts();
    DisplayManager::new().show_facts(
        facts
            .iter()
            .map(|f| (f.question.as_str(), f.answer.as_str())),
    );
}

fn show_config(config: &Config) -> Result<()> {
    println!("{}", "TaxBuddy Configuration".bold().cyan());
    match Config::config_path() {
        Ok(path) => println!("{}\n", format!("# {}", path.display()).dimmed()),
        Err(_) => println!(),
    }
    println!("{}", toml::to_string_pretty(config).context("Failed to render config")?);
    Ok(())
}

fn spinner_display(verbosity: Verbosity) -> DisplayManager {
    if verbosity.show_progress() {
        DisplayManager::new()
    } else {
        DisplayManager::new().without_spinner()
    }
}

/// Ollama client wrapped in the configured retry policy
fn build_generator(config: &Config) -> Result<Arc<dyn TextGenerator>> {
    let client = OllamaClient::with_timeout(
        &config.generation.base_url,
        &config.generation.model,
        config.timeout(),
    )?
    .with_options(config.generation_options());

    Ok(Arc::new(ResilientGenerator::new(client, config.retry_policy())))
}

async fn build_embedder(config: &Config, verbosity: Verbosity) -> Result<Arc<dyn Embedder>> {
    match config.embedding.backend {
        EmbeddingBackend::Hashing => Ok(Arc::new(HashingEmbedder::new(config.embedding.dimension)?)),
        EmbeddingBackend::Bert => {
            let spinner = verbosity.show_progress().then(|| {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                    pb.set_style(style);
                }
                pb.set_message("Loading embedding model...");
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            });

            let model_id = config.embedding.model_id.clone();
            let loaded = tokio::task::spawn_blocking(move || BertEmbedder::from_hub(&model_id))
                .await
                .context("Embedding model loader panicked")?;

            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }

            let embedder = loaded.context(
                "Failed to load embedding model (use --embedder hashing to run without it)",
            )?;
            Ok(Arc::new(embedder))
        }
    }
}

/// Build the fact index and wire retrieval to generation. Any failure here is
/// fatal: the chat cannot run without its facts.
async fn build_pipeline(config: &Config, verbosity: Verbosity) -> Result<ChatPipeline> {
    let embedder = build_embedder(config, verbosity).await?;
    let generator = build_generator(config)?;

    let pipeline = ChatPipeline::build(
        &tax_facts(),
        embedder,
        generator,
        config.retrieval.max_distance,
    )
    .context("Failed to build the fact index")?;

    info!(
        facts = pipeline.index().len(),
        model = %config.generation.model,
        "Pipeline ready"
    );
    Ok(pipeline)
}
