//! Terminal error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerminalError {
    #[error("Failed to spawn terminal: {0}")]
    Spawn(String),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No such directory: {0}")]
    NoSuchDirectory(String),

    #[error("Failed to send {signal} to process {pid}: {source}")]
    Signal {
        pid: u32,
        signal: crate::Signal,
        #[source]
        source: std::io::Error,
    },

    #[error("Terminal process has exited")]
    Exited,
}
