//! Display manager for the chat terminal UI
//!
//! Spinner while a turn is in flight, colored answers, fact and history
//! listings, report tables.

use colored::*;
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::time::Duration;

use crate::extract::report::FinancialReport;
use crate::rag::composer::ComposeMode;
use crate::rag::pipeline::TurnReport;
use crate::session::{Message, Role};
use crate::telemetry::TelemetryStats;

/// Label shown in front of every assistant answer
pub const ASSISTANT_LABEL: &str = "Income Tax Expert";

pub struct DisplayManager {
    current_spinner: Option<ProgressBar>,
    update_interval: Duration,
    show_spinner: bool,
}

impl DisplayManager {
    pub fn new() -> Self {
        DisplayManager {
            current_spinner: None,
            update_interval: Duration::from_millis(100),
            show_spinner: true,
        }
    }

    /// Disable the spinner (quiet mode, non-interactive output)
    pub fn without_spinner(mut self) -> Self {
        self.show_spinner = false;
        self
    }

    /// Show welcome banner
    pub fn show_banner(&self, version: &str, model: &str, fact_count: usize) {
        let width = 64;
        let rule = "=".repeat(width);
        let title = format!("  TaxBuddy {} - Income Tax Chatbot", version);
        let info = format!("  Model: {} | Facts: {} | Mode: Chat", model, fact_count);

        println!("\n{}", rule.cyan());
        println!("{}", title.bold().cyan());
        println!("{}", info.dimmed());
        println!("{}\n", rule.cyan());
        println!(
            "Ask any income-tax question (or {} for commands, {} to quit)\n",
            "/help".green(),
            "/exit".green()
        );
    }

    /// Start the "Thinking..." spinner
    pub fn start_thinking(&mut self) {
        self.finish_current();
        if !self.show_spinner {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(self.update_interval);
        self.current_spinner = Some(spinner);
    }

    pub fn finish_current(&mut self) {
        if let Some(spinner) = self.current_spinner.take() {
            spinner.finish_and_clear();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.current_spinner.is_some()
    }

    /// Print the answer for one turn
    pub fn show_answer(&mut self, report: &TurnReport, verbose: bool) {
        self.finish_current();

        if verbose {
            match &report.retrieved {
                Some(hit) => println!(
                    "{} {} {}",
                    "→".cyan(),
                    format!("Matched fact #{}: {}", hit.row + 1, hit.question).dimmed(),
                    format!("(distance {:.3})", hit.distance).dimmed()
                ),
                None => println!("{} {}", "→".cyan(), "No matching fact".dimmed()),
            }
        }

        println!();
        if let Some(label) = answer_label(report) {
            println!("{}", format!("{}:", label).bold().cyan());
        }
        if report.is_error() {
            println!("{}", report.answer.red());
        } else {
            println!("{}", report.answer);
        }

        if verbose {
            println!(
                "{}",
                format!("({} in {}ms)", report.outcome.display_name(), report.duration_ms).dimmed()
            );
        }
        println!();
    }

    /// List question/answer pairs
    pub fn show_facts<'a, I>(&self, facts: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        I::IntoIter: ExactSizeIterator,
    {
        let facts = facts.into_iter();
        if facts.len() == 0 {
            println!("{}", "The fact table is empty.".yellow());
            return;
        }

        self.show_section(&format!("Tax Facts ({}):", facts.len()));
        for (i, (question, answer)) in facts.enumerate() {
            println!("  {}. {}", (i + 1).to_string().cyan(), question.bold());
            println!("     {}", answer);
        }
        println!();
    }

    pub fn show_history(&self, messages: &[Message]) {
        if messages.is_empty() {
            println!("{}", "No messages in this session yet.".yellow());
            return;
        }

        self.show_section(&format!("Conversation (last {}):", messages.len()));
        for message in messages {
            let time = message.timestamp.format("%H:%M:%S").to_string();
            let speaker = match message.role {
                Role::User => "You".green().bold(),
                Role::Assistant => ASSISTANT_LABEL.cyan().bold(),
            };
            println!("  {} {}: {}", time.dimmed(), speaker, message.content);
        }
        println!();
    }

    pub fn show_stats(&self, stats: &TelemetryStats, success_rate: f64, average_turn_ms: u64, duration_secs: i64) {
        self.show_section("Session Stats:");
        println!("  Questions:        {}", stats.turns_started.to_string().green());
        println!("  Facts retrieved:  {}", stats.facts_retrieved.to_string().green());
        println!("  No match:         {}", stats.retrieval_misses.to_string().green());
        println!("  Errors:           {}", stats.turns_failed.to_string().red());
        println!("  Success rate:     {}", format!("{:.1}%", success_rate * 100.0).green());
        println!("  Avg turn time:    {}", format_duration_ms(average_turn_ms).green());
        println!("  Session duration: {}", format_duration_secs(duration_secs).green());
        println!();
    }

    pub fn show_report(&self, report: &FinancialReport) {
        if report.is_empty() {
            println!("{}", "No figures found.".yellow());
            return;
        }

        for line in report.render_table().lines() {
            if line.starts_with(' ') {
                println!("{}", line);
            } else {
                self.show_section(line);
            }
        }
        println!();
    }

    pub fn show_error(&self, error: &str) {
        println!("{} {}", "Error:".red().bold(), error.red());
    }

    pub fn show_warning(&self, warning: &str) {
        println!("{} {}", "Warning:".yellow().bold(), warning.yellow());
    }

    pub fn show_info(&self, info: &str) {
        println!("{} {}", "Info:".cyan(), info);
    }

    pub fn clear_screen(&self) -> io::Result<()> {
        execute!(io::stdout(), Clear(ClearType::All), cursor::MoveTo(0, 0))
    }

    pub fn show_section(&self, title: &str) {
        println!("\n{}", title.bold().cyan());
        println!("{}", "-".repeat(60).cyan());
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Only answers rewritten from a stored fact speak as the expert
fn answer_label(report: &TurnReport) -> Option<&'static str> {
    (report.mode == Some(ComposeMode::Expand) && !report.is_error()).then_some(ASSISTANT_LABEL)
}

fn format_duration_ms(ms: u64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}ms", ms)
    }
}

fn format_duration_secs(secs: i64) -> String {
    let secs = secs.max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
