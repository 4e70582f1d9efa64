//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Tab error: {0}")]
    Tab(#[from] tabshell_tabs::TabError),

    #[error("Invalid session document: {0}")]
    Format(String),

    #[error("Failed to persist sessions: {0}")]
    Persistence(#[from] tabshell_storage::StorageError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SessionError {
    /// A session index that does not exist
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            SessionError::Tab(tabshell_tabs::TabError::IndexOutOfRange { .. })
        )
    }

    /// A shell that could not be started
    pub fn is_spawn_error(&self) -> bool {
        matches!(self, SessionError::Tab(tabshell_tabs::TabError::Spawn(_)))
    }
}
