//! tabshell Core
//!
//! Entry point for a tabbed terminal front end. The front end owns windows,
//! menus and dialogs; everything about which shells are open, what they are
//! called and how they survive a restart is reached through [`Host`].

mod config;
mod error;
mod host;

pub use config::{Config, STATE_FILE_NAME};
pub use error::CoreError;
pub use host::Host;

// Re-export core components
pub use tabshell_session::{LoadReport, RestoreWarning, SessionError, SessionManager};
pub use tabshell_storage::{StateFile, StorageError};
pub use tabshell_tabs::{
    SessionEvent, SessionId, SessionRecord, SessionSnapshot, SessionState, SessionStore, TabColor,
    TabError, TitlePolicy,
};
pub use tabshell_terminal::{
    PtySpawner, Signal, TerminalError, TerminalOutput, TerminalSession, TerminalSpawner,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
