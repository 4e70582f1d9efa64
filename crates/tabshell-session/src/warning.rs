//! Non-fatal problems found while restoring sessions

/// Something that went wrong restoring saved sessions without stopping the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreWarning {
    /// The document could not be used at all; nothing was restored
    Format { reason: String },
    /// Entry `entry` of the `tabs` array was skipped
    SkippedEntry { entry: usize, reason: String },
    /// Entry `entry` had an unusable `path`; restored in the default directory
    DroppedPath { entry: usize, reason: String },
    /// Entry `entry` had an unusable `color`; restored uncolored
    DroppedColor { entry: usize, value: String },
    /// The session opened but could not enter its saved directory
    Navigation {
        title: String,
        path: String,
        reason: String,
    },
    /// The shell for a saved session could not be started
    Spawn { title: String, reason: String },
}

impl std::fmt::Display for RestoreWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestoreWarning::Format { reason } => {
                write!(f, "saved sessions ignored: {}", reason)
            }
            RestoreWarning::SkippedEntry { entry, reason } => {
                write!(f, "tab entry {} skipped: {}", entry, reason)
            }
            RestoreWarning::DroppedPath { entry, reason } => {
                write!(f, "tab entry {} path ignored: {}", entry, reason)
            }
            RestoreWarning::DroppedColor { entry, value } => {
                write!(f, "tab entry {} color ignored: {}", entry, value)
            }
            RestoreWarning::Navigation {
                title,
                path,
                reason,
            } => write!(f, "tab {:?} could not enter {}: {}", title, path, reason),
            RestoreWarning::Spawn { title, reason } => {
                write!(f, "tab {:?} could not be opened: {}", title, reason)
            }
        }
    }
}
