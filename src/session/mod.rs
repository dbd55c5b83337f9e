//! Session state: transcript plus the per-turn state machine

pub mod state;
pub mod transcript;

pub use state::{SessionState, TurnEvent, TurnState};
pub use transcript::{Message, Role, Transcript};
