//! tabshell Terminal Sessions
//!
//! The contract the tab core consumes from a running shell: its process id,
//! its working directory, and the handful of commands the core issues to it.
//! [`PtySpawner`] provides shells backed by a pseudo-terminal; rendering and
//! keystroke forwarding live with whoever consumes the output channel.

mod error;
mod pty;
mod session;
mod signal;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::TerminalError;
pub use pty::{default_shell, PtySpawner, PtyTerminal, TerminalOutput};
pub use session::{TerminalSession, TerminalSpawner};
pub use signal::Signal;

pub type Result<T> = std::result::Result<T, TerminalError>;
