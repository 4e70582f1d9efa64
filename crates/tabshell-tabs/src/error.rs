//! Session store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Session index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Failed to spawn terminal: {0}")]
    Spawn(#[source] tabshell_terminal::TerminalError),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}
