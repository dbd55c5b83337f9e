//! Telemetry for TaxBuddy
//!
//! Log setup plus an in-memory collector of turn events for the session summary.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use crate::cli::Verbosity;
use crate::rag::composer::ComposeMode;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the CLI verbosity picks the level.
/// Logs go to stderr so answers on stdout stay clean.
pub fn init_logging(verbosity: Verbosity) {
    let default_directive = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "taxbuddy=info,warn",
        Verbosity::VeryVerbose => "taxbuddy=debug,info",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second init (tests, embedding the library) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    tracing::debug!(verbosity = verbosity.as_str(), "Logging initialized");
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    TurnStarted {
        timestamp: Instant,
    },
    FactRetrieved {
        row: usize,
        distance: f32,
        timestamp: Instant,
    },
    RetrievalMiss {
        timestamp: Instant,
    },
    TurnCompleted {
        mode: ComposeMode,
        duration_ms: u64,
        timestamp: Instant,
    },
    TurnFailed {
        reason: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub turns_started: usize,
    pub turns_completed: usize,
    pub turns_failed: usize,
    pub facts_retrieved: usize,
    pub retrieval_misses: usize,
    pub expanded_answers: usize,
    pub out_of_scope_replies: usize,
    pub total_turn_ms: u64,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        if let Ok(mut stats) = self.stats.lock() {
            match &event {
                TelemetryEvent::TurnStarted { .. } => {
                    stats.turns_started += 1;
                }
                TelemetryEvent::FactRetrieved { .. } => {
                    stats.facts_retrieved += 1;
                }
                TelemetryEvent::RetrievalMiss { .. } => {
                    stats.retrieval_misses += 1;
                }
                TelemetryEvent::TurnCompleted { mode, duration_ms, .. } => {
                    stats.turns_completed += 1;
                    stats.total_turn_ms += duration_ms;
                    match mode {
                        ComposeMode::Expand => stats.expanded_answers += 1,
                        ComposeMode::OutOfScope => stats.out_of_scope_replies += 1,
                    }
                }
                TelemetryEvent::TurnFailed { .. } => {
                    stats.turns_failed += 1;
                }
            }
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => {
                let start = events.len().saturating_sub(n);
                events[start..].to_vec()
            }
            Err(_) => Vec::new(),
        }
    }

    /// Fraction of finished turns that did not error
    pub fn success_rate(&self) -> f64 {
        let stats = self.get_stats();
        let total = stats.turns_completed + stats.turns_failed;
        if total == 0 {
            1.0
        } else {
            stats.turns_completed as f64 / total as f64
        }
    }

    /// Mean wall time of completed turns
    pub fn average_turn_ms(&self) -> u64 {
        let stats = self.get_stats();
        if stats.turns_completed == 0 {
            0
        } else {
            stats.total_turn_ms / stats.turns_completed as u64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.verbosity.show_progress() {
            return;
        }

        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        println!("\n📊 Session Summary");
        println!("─────────────────────────────────────");
        println!("Duration:          {:.1}s", elapsed.as_secs_f64());
        println!("Questions:         {}", stats.turns_started);
        println!("Expanded answers:  {}", stats.expanded_answers);
        println!("Out-of-scope:      {}", stats.out_of_scope_replies);
        println!("Errors:            {}", stats.turns_failed);
        println!("Success rate:      {:.1}%", self.collector.success_rate() * 100.0);
        println!("Avg turn time:     {}ms", self.collector.average_turn_ms());
        if self.should_show_details() {
            println!("Facts retrieved:   {}", stats.facts_retrieved);
            println!("No match:          {}", stats.retrieval_misses);
            println!("Events recorded:   {}", self.collector.event_count());
        }
        println!();
    }

    /// Check if should show detailed output
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_counts() {
        let collector = TelemetryCollector::new();
        collector.record(TelemetryEvent::TurnStarted { timestamp: Instant::now() });
        collector.record(TelemetryEvent::FactRetrieved {
            row: 3,
            distance: 0.4,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::TurnCompleted {
            mode: ComposeMode::Expand,
            duration_ms: 120,
            timestamp: Instant::now(),
        });

        let stats = collector.get_stats();
        assert_eq!(stats.turns_started, 1);
        assert_eq!(stats.facts_retrieved, 1);
        assert_eq!(stats.expanded_answers, 1);
        assert_eq!(collector.event_count(), 3);
        assert_eq!(collector.average_turn_ms(), 120);
    }

    #[test]
    fn test_success_rate() {
        let collector = TelemetryCollector::new();
        assert_eq!(collector.success_rate(), 1.0);

        collector.record(TelemetryEvent::TurnCompleted {
            mode: ComposeMode::OutOfScope,
            duration_ms: 10,
            timestamp: Instant::now(),
        });
        collector.record(TelemetryEvent::TurnFailed {
            reason: "timeout".to_string(),
            timestamp: Instant::now(),
        });
        assert!((collector.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_recent_events() {
        let collector = TelemetryCollector::new();
        for _ in 0..5 {
            collector.record(TelemetryEvent::RetrievalMiss { timestamp: Instant::now() });
        }
        assert_eq!(collector.recent_events(2).len(), 2);
        assert_eq!(collector.get_stats().retrieval_misses, 5);
    }

    #[test]
    fn test_details_follow_verbosity() {
        let collector = TelemetryCollector::new();
        assert!(!TelemetryDisplay::new(collector.clone(), Verbosity::Normal).should_show_details());
        assert!(TelemetryDisplay::new(collector, Verbosity::Verbose).should_show_details());
    }
}
