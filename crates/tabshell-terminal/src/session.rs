//! Terminal session contract

use std::path::PathBuf;

use crate::signal::Signal;
use crate::Result;

/// One running shell process plus its display surface.
///
/// The tab core never reads output or forwards keystrokes; it only asks
/// where the shell is and tells it where to go.
pub trait TerminalSession: Send {
    /// OS process id of the shell, if it is known
    fn process_id(&self) -> Option<u32>;

    /// Directory the shell is currently in
    fn current_working_directory(&self) -> Result<PathBuf>;

    /// Change the shell's directory. Relative paths are resolved by the shell.
    fn navigate_to(&mut self, path: &str) -> Result<()>;

    /// Clear whatever the shell has printed so far
    fn reset_display(&mut self) -> Result<()>;

    /// Deliver `signal` to the shell and return without waiting for it to exit.
    fn terminate(&mut self, signal: Signal) -> Result<()>;
}

/// Creates new terminal sessions.
pub trait TerminalSpawner: Send + Sync {
    fn spawn(&self) -> Result<Box<dyn TerminalSession>>;
}
