//! Per-turn state machine and the session value object
//!
//! Turn lifecycle:
//!
//! ```text
//! Idle -> Retrieving -> ComposingExpand     -> Done -> Idle
//!                    -> ComposingOutOfScope -> Done -> Idle
//! (any in-progress state) -> Errored -> Idle
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{BuddyError, Result};
use crate::session::transcript::Transcript;

/// Where a turn currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnState {
    /// Waiting for the next query
    Idle,

    /// Embedding the query and searching the fact index
    Retrieving,

    /// Asking the generator to rephrase a retrieved fact
    ComposingExpand,

    /// Asking the generator for a polite out-of-scope reply
    ComposingOutOfScope,

    /// Answer produced
    Done,

    /// Something external failed; the turn still produced a message
    Errored,
}

/// Events that move a turn forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    QueryReceived,
    MatchFound,
    NoMatch,
    Composed,
    Failed,
    Reset,
}

impl TurnState {
    /// A turn is in flight
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            TurnState::Retrieving | TurnState::ComposingExpand | TurnState::ComposingOutOfScope
        )
    }

    /// The turn has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Done | TurnState::Errored)
    }

    /// Transition function
    ///
    /// Valid edges:
    /// 1. Idle                -> Retrieving          (QueryReceived)
    /// 2. Retrieving          -> ComposingExpand     (MatchFound)
    /// 3. Retrieving          -> ComposingOutOfScope (NoMatch)
    /// 4. ComposingExpand     -> Done                (Composed)
    /// 5. ComposingOutOfScope -> Done                (Composed)
    /// 6. in-progress         -> Errored             (Failed)
    /// 7. Done | Errored      -> Idle                (Reset)
    pub fn transition(&self, event: TurnEvent) -> Result<TurnState> {
        use TurnEvent::*;
        use TurnState::*;

        let next = match (self, event) {
            (Idle, QueryReceived) => Retrieving,
            (Retrieving, MatchFound) => ComposingExpand,
            (Retrieving, NoMatch) => ComposingOutOfScope,
            (ComposingExpand, Composed) | (ComposingOutOfScope, Composed) => Done,
            (state, Failed) if state.is_in_progress() => Errored,
            (Done, Reset) | (Errored, Reset) => Idle,
            (from, event) => {
                return Err(BuddyError::InvalidTransition {
                    from: format!("{:?}", from),
                    event: format!("{:?}", event),
                });
            }
        };

        Ok(next)
    }

    /// Human-readable state name
    pub fn display_name(&self) -> &'static str {
        match self {
            TurnState::Idle => "Idle",
            TurnState::Retrieving => "Searching facts",
            TurnState::ComposingExpand => "Composing answer",
            TurnState::ComposingOutOfScope => "Composing reply",
            TurnState::Done => "Done",
            TurnState::Errored => "Error",
        }
    }
}

/// Everything one interactive session owns
///
/// Passed by value into each turn and handed back afterwards; no ambient
/// global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub transcript: Transcript,
    pub turn_state: TurnState,
    pub turns: usize,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            transcript: Transcript::new(),
            turn_state: TurnState::Idle,
            turns: 0,
        }
    }

    /// Apply an event to the current turn state
    pub fn advance(&mut self, event: TurnEvent) -> Result<TurnState> {
        self.turn_state = self.turn_state.transition(event)?;
        Ok(self.turn_state)
    }

    /// Drop the transcript and start over with a fresh id
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Seconds since the session started
    pub fn duration_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_expand() {
        let mut state = TurnState::Idle;
        state = state.transition(TurnEvent::QueryReceived).unwrap();
        assert_eq!(state, TurnState::Retrieving);
        state = state.transition(TurnEvent::MatchFound).unwrap();
        assert_eq!(state, TurnState::ComposingExpand);
        state = state.transition(TurnEvent::Composed).unwrap();
        assert_eq!(state, TurnState::Done);
        state = state.transition(TurnEvent::Reset).unwrap();
        assert_eq!(state, TurnState::Idle);
    }

    #[test]
    fn test_no_match_path() {
        let state = TurnState::Retrieving.transition(TurnEvent::NoMatch).unwrap();
        assert_eq!(state, TurnState::ComposingOutOfScope);
        assert_eq!(state.transition(TurnEvent::Composed).unwrap(), TurnState::Done);
    }

    #[test]
    fn test_failure_from_in_progress_states() {
        for state in [
            TurnState::Retrieving,
            TurnState::ComposingExpand,
            TurnState::ComposingOutOfScope,
        ] {
            assert_eq!(state.transition(TurnEvent::Failed).unwrap(), TurnState::Errored);
        }
        assert_eq!(
            TurnState::Errored.transition(TurnEvent::Reset).unwrap(),
            TurnState::Idle
        );
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(TurnState::Idle.transition(TurnEvent::Composed).is_err());
        assert!(TurnState::Idle.transition(TurnEvent::Failed).is_err());
        assert!(TurnState::Done.transition(TurnEvent::QueryReceived).is_err());
        assert!(TurnState::Retrieving.transition(TurnEvent::QueryReceived).is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(TurnState::Retrieving.display_name(), "Searching facts");
        assert_eq!(TurnState::Errored.display_name(), "Error");
    }

    #[test]
    fn test_terminal_states() {
        assert!(TurnState::Done.is_terminal());
        assert!(TurnState::Errored.is_terminal());
        assert!(!TurnState::Idle.is_terminal());
        assert!(!TurnState::Retrieving.is_terminal());
    }

    #[test]
    fn test_session_advance_and_reset() {
        let mut session = SessionState::new();
        let id = session.id;
        session.advance(TurnEvent::QueryReceived).unwrap();
        session.transcript.push_user("hi");

        session.reset();
        assert_ne!(session.id, id);
        assert_eq!(session.turn_state, TurnState::Idle);
        assert!(session.transcript.is_empty());
        assert_eq!(session.turns, 0);
    }
}
