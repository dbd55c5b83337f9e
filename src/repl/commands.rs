//! Command handler for chat built-in commands

use anyhow::Result;
use colored::*;

use crate::knowledge::index::FactIndex;
use crate::repl::display::DisplayManager;
use crate::session::SessionState;
use crate::telemetry::TelemetryCollector;

/// Chat command types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    History { limit: Option<usize> },
    Facts,
    Stats,
    Reset,
    Verbose { enable: bool },
    Clear,
    Exit,
    Unknown { input: String },
}

/// What a command needs to look at or change
pub struct CommandContext<'a> {
    pub session: &'a mut SessionState,
    pub index: &'a FactIndex,
    pub telemetry: &'a TelemetryCollector,
    pub display: &'a DisplayManager,
}

pub struct CommandHandler {
    verbose: bool,
}

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler { verbose: false }
    }

    /// Parse input string into a command
    pub fn parse(&self, input: &str) -> Command {
        let trimmed = input.trim();

        let Some(body) = trimmed.strip_prefix('/') else {
            return Command::Unknown { input: input.to_string() };
        };

        let parts: Vec<&str> = body.split_whitespace().collect();
        let Some(name) = parts.first() else {
            return Command::Unknown { input: input.to_string() };
        };

        match name.to_lowercase().as_str() {
            "help" | "h" => Command::Help,
            "exit" | "quit" | "q" => Command::Exit,
            "history" => {
                let limit = parts.get(1).and_then(|s| s.parse().ok());
                Command::History { limit }
            }
            "facts" => Command::Facts,
            "stats" | "status" => Command::Stats,
            "reset" => Command::Reset,
            "verbose" => {
                let enable = parts
                    .get(1)
                    .map(|s| matches!(s.to_lowercase().as_str(), "on" | "1" | "true"))
                    .unwrap_or(true);
                Command::Verbose { enable }
            }
            "clear" | "cls" => Command::Clear,
            _ => Command::Unknown { input: input.to_string() },
        }
    }

    /// Execute a command
    ///
    /// Returns true if the chat should continue, false if it should exit
    pub fn execute(&mut self, command: Command, ctx: &mut CommandContext<'_>) -> Result<bool> {
        match command {
            Command::Help => self.show_help(),
            Command::Exit => {
                println!("{}", "Goodbye!".green());
                return Ok(false);
            }
            Command::History { limit } => {
                let messages = ctx.session.transcript.recent(limit.unwrap_or(10));
                ctx.display.show_history(messages);
            }
            Command::Facts => ctx.display.show_facts(
                ctx.index
                    .records()
                    .iter()
                    .map(|r| (r.question.as_str(), r.answer.as_str())),
            ),
            Command::Stats => ctx.display.show_stats(
                &ctx.telemetry.get_stats(),
                ctx.telemetry.success_rate(),
                ctx.telemetry.average_turn_ms(),
                ctx.session.duration_secs(),
            ),
            Command::Reset => {
                ctx.session.reset();
                println!("{}", "Session reset. Conversation cleared.".yellow());
            }
            Command::Verbose { enable } => {
                self.verbose = enable;
                let status = if enable { "enabled" } else { "disabled" };
                println!("{}", format!("Verbose mode {}", status).cyan());
            }
            Command::Clear => ctx.display.clear_screen()?,
            Command::Unknown { input } => {
                println!("{}", format!("Unknown command: {}", input).red());
                println!("Type {} for available commands", "/help".cyan());
            }
        }
        Ok(true)
    }

    fn show_help(&self) {
        println!("\n{}", "Available Commands:".bold().cyan());
        println!("{}", "=".repeat(60).cyan());

        let commands = [
            ("/help, /h", "Show this help message"),
            ("/history [n]", "Show the last n messages (default: 10)"),
            ("/facts", "List the tax facts"),
            ("/stats", "Show session statistics"),
            ("/reset", "Clear the conversation"),
            ("/verbose [on|off]", "Show matched facts and timings"),
            ("/clear, /cls", "Clear screen"),
            ("/exit, /quit, /q", "Exit"),
        ];

        for (cmd, desc) in commands {
            println!("  {:<20} {}", cmd.green(), desc);
        }

        println!("\n{}", "Usage:".bold());
        println!("  - Type your question directly (no / prefix)");
        println!("  - Use {} for input history", "UP/DOWN arrows".cyan());
        println!("  - Press {} or {} to exit", "Ctrl-D".cyan(), "/exit".cyan());
        println!();
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn set_verbose(&mut self, enable: bool) {
        self.verbose = enable;
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if input is a command (starts with /)
pub fn is_command(input: &str) -> bool {
    input.trim().starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(handler: &mut CommandHandler, command: Command, session: &mut SessionState) -> bool {
        let index = FactIndex::empty(384);
        let telemetry = TelemetryCollector::new();
        let display = DisplayManager::new();
        let mut ctx = CommandContext {
            session,
            index: &index,
            telemetry: &telemetry,
            display: &display,
        };
        handler.execute(command, &mut ctx).unwrap()
    }

    #[test]
    fn test_is_command() {
        assert!(is_command("/help"));
        assert!(is_command(" /facts"));
        assert!(!is_command("What is the standard deduction?"));
    }

    #[test]
    fn test_parse_commands() {
        let handler = CommandHandler::new();
        assert_eq!(handler.parse("/help"), Command::Help);
        assert_eq!(handler.parse("/q"), Command::Exit);
        assert_eq!(handler.parse("/facts"), Command::Facts);
        assert_eq!(handler.parse("/stats"), Command::Stats);
        assert_eq!(handler.parse("/reset"), Command::Reset);
        assert_eq!(handler.parse("/cls"), Command::Clear);
        assert_eq!(handler.parse("/history"), Command::History { limit: None });
        assert_eq!(handler.parse("/history 4"), Command::History { limit: Some(4) });
        assert_eq!(handler.parse("/verbose off"), Command::Verbose { enable: false });
    }

    #[test]
    fn test_parse_unknown() {
        let handler = CommandHandler::new();
        assert!(matches!(handler.parse("/weather"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("/"), Command::Unknown { .. }));
        assert!(matches!(handler.parse("tax slabs"), Command::Unknown { .. }));
    }

    #[test]
    fn test_execute_exit_and_help() {
        let mut handler = CommandHandler::new();
        let mut session = SessionState::new();
        assert!(!run(&mut handler, Command::Exit, &mut session));
        assert!(run(&mut handler, Command::Help, &mut session));
        assert!(run(&mut handler, Command::Facts, &mut session));
        assert!(run(&mut handler, Command::Stats, &mut session));
    }

    #[test]
    fn test_execute_reset_clears_transcript() {
        let mut handler = CommandHandler::new();
        let mut session = SessionState::new();
        session.transcript.push_user("hi");
        session.transcript.push_assistant("hello");

        run(&mut handler, Command::History { limit: Some(1) }, &mut session);
        run(&mut handler, Command::Reset, &mut session);
        assert!(session.transcript.is_empty());
    }

    #[test]
    fn test_execute_verbose() {
        let mut handler = CommandHandler::new();
        let mut session = SessionState::new();
        run(&mut handler, Command::Verbose { enable: true }, &mut session);
        assert!(handler.is_verbose());
        run(&mut handler, Command::Verbose { enable: false }, &mut session);
        assert!(!handler.is_verbose());
    }
}
