//! CLI module for TaxBuddy
//!
//! Handles command-line argument parsing and verbosity.

pub mod args;

pub use args::{Args, Commands, Verbosity};
