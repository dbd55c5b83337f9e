//! Interactive chat loop
//!
//! Reads a line, runs a built-in command or a full pipeline turn, prints the
//! result. One turn finishes before the next line is read.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;

use crate::cli::Verbosity;
use crate::rag::pipeline::{ChatPipeline, TurnReport};
use crate::repl::commands::{is_command, CommandContext, CommandHandler};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::InputHandler;
use crate::session::SessionState;
use crate::telemetry::TelemetryDisplay;

pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    session: SessionState,
}

impl ReplSession {
    pub fn new() -> Result<Self> {
        Ok(Self::from_input(InputHandler::new()?))
    }

    /// Create a chat with persistent input history
    pub fn with_history(history_path: PathBuf) -> Result<Self> {
        Ok(Self::from_input(InputHandler::with_history(history_path)?))
    }

    fn from_input(input_handler: InputHandler) -> Self {
        ReplSession {
            input_handler,
            command_handler: CommandHandler::new(),
            display_manager: DisplayManager::new(),
            session: SessionState::new(),
        }
    }

    /// Apply CLI verbosity: quiet hides the spinner, -v shows matched facts
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        if !verbosity.show_progress() {
            self.display_manager = DisplayManager::new().without_spinner();
        }
        self.command_handler.set_verbose(verbosity.show_events());
        self
    }

    pub fn show_welcome(&self, version: &str, model: &str, fact_count: usize) {
        self.display_manager.show_banner(version, model, fact_count);
    }

    /// Run until `/exit` or EOF, then save history and print the summary
    pub async fn run(&mut self, pipeline: &ChatPipeline, verbosity: Verbosity) -> Result<()> {
        while let Some(line) = self.input_handler.read_line()? {
            if !self.handle_input(pipeline, &line).await? {
                break;
            }
        }

        self.save()?;
        TelemetryDisplay::new(pipeline.telemetry().clone(), verbosity).display_summary();
        Ok(())
    }

    /// Handle one line of input
    ///
    /// Returns true if the chat should continue, false to exit
    pub async fn handle_input(&mut self, pipeline: &ChatPipeline, input: &str) -> Result<bool> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(true);
        }

        if is_command(input) {
            let command = self.command_handler.parse(input);
            let mut ctx = CommandContext {
                session: &mut self.session,
                index: pipeline.index(),
                telemetry: pipeline.telemetry(),
                display: &self.display_manager,
            };
            return self.command_handler.execute(command, &mut ctx);
        }

        self.ask(pipeline, input).await;
        Ok(true)
    }

    /// Run one question through the pipeline and print the answer
    pub async fn ask(&mut self, pipeline: &ChatPipeline, question: &str) -> TurnReport {
        self.display_manager.start_thinking();

        let session = std::mem::take(&mut self.session);
        let (session, report) = pipeline.process_turn(session, question).await;
        self.session = session;

        self.display_manager
            .show_answer(&report, self.command_handler.is_verbose());
        report
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn is_verbose(&self) -> bool {
        self.command_handler.is_verbose()
    }

    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()
    }
}
