//! Session record data structure
//!
//! What a tab shows and what survives a restart:
//! - Title
//! - Color tag
//! - Working directory (queried live from the shell when saving)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::TabColor;
use crate::error::TabError;
use crate::state::SessionState;
use crate::Result;

/// Stable identity of a session. Unlike its index, it never changes while
/// the session is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier
    pub id: SessionId,
    /// Tab label
    pub title: String,
    /// Directory the session was last sent to, used when the shell cannot be asked
    pub working_directory: Option<String>,
    /// User-assigned tag, `None` when uncolored
    pub color: Option<TabColor>,
    /// Current state in the lifecycle
    pub state: SessionState,
    /// When the session was opened
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(title: String) -> Self {
        let now = Utc::now();

        Self {
            id: SessionId::new(),
            title,
            working_directory: None,
            color: None,
            state: SessionState::Created,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attempt to transition to a new state
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<()> {
        if !self.state.can_transition_to(new_state) {
            return Err(TabError::InvalidTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        tracing::debug!(
            session_id = %self.id,
            from = %self.state,
            to = %new_state,
            "Session state transition"
        );

        self.state = new_state;
        self.updated_at = Utc::now();

        Ok(())
    }

    pub fn activate(&mut self) -> Result<()> {
        self.transition_to(SessionState::Active)
    }

    pub fn begin_close(&mut self) -> Result<()> {
        self.transition_to(SessionState::Closing)
    }

    pub fn finish_close(&mut self) -> Result<()> {
        self.transition_to(SessionState::Closed)
    }

    /// Change the title. An empty title is ignored; returns whether anything changed.
    pub fn rename(&mut self, title: String) -> bool {
        if title.is_empty() || title == self.title {
            return false;
        }

        self.title = title;
        self.updated_at = Utc::now();
        true
    }

    /// Set or clear the color tag. The unset sentinel clears it.
    pub fn set_color(&mut self, color: Option<TabColor>) {
        self.color = TabColor::normalize(color);
        self.updated_at = Utc::now();
    }

    pub fn remember_directory(&mut self, path: String) {
        self.working_directory = Some(path);
        self.updated_at = Utc::now();
    }
}

/// Serializable projection of a session, taken when saving and replayed when loading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub title: String,
    /// `None` leaves a restored session in its default directory
    pub working_directory: Option<String>,
    pub color: Option<TabColor>,
}

impl SessionSnapshot {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_directory(mut self, path: impl Into<String>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    pub fn with_color(mut self, color: TabColor) -> Self {
        self.color = TabColor::normalize(Some(color));
        self
    }
}
