//! Default tab titles

use serde::{Deserialize, Serialize};

/// How untitled sessions are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitlePolicy {
    /// "Terminal {n}" with n = open sessions + 1. Numbers are reused after
    /// closes and may collide with an existing tab.
    #[default]
    Count,
    /// "Terminal {n}" with n counting every session this store ever created
    Monotonic,
}

impl TitlePolicy {
    /// `open` is the number of sessions currently open, `created` the number
    /// this store has created so far.
    pub fn title_for(&self, open: usize, created: u64) -> String {
        let n = match self {
            TitlePolicy::Count => open as u64 + 1,
            TitlePolicy::Monotonic => created + 1,
        };
        format!("Terminal {}", n)
    }
}
