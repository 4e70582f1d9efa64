//! Notifications for the presentation layer

use crate::record::SessionId;

/// Published after every store mutation. `index` is the position at the time
/// of the event; removals shift later indices down by one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session appended to the end of the tab order
    Added { id: SessionId, index: usize },

    /// Session closed and removed
    Removed { id: SessionId, index: usize },

    /// Title or color changed
    Updated { id: SessionId, index: usize },
}

impl SessionEvent {
    pub fn id(&self) -> &SessionId {
        match self {
            SessionEvent::Added { id, .. }
            | SessionEvent::Removed { id, .. }
            | SessionEvent::Updated { id, .. } => id,
        }
    }
}
