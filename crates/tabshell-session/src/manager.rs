//! Session Manager
//!
//! The operations the presentation layer calls: open, close, rename and
//! recolor tabs, and save or restore the whole set.

use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

use tabshell_storage::StateFile;
use tabshell_tabs::{SessionEvent, SessionRecord, SessionSnapshot, SessionStore, TabColor};

use crate::codec;
use crate::error::SessionError;
use crate::warning::RestoreWarning;
use crate::Result;

/// What a load restored
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Sessions opened from the document
    pub restored: usize,
    pub warnings: Vec<RestoreWarning>,
}

pub struct SessionManager {
    store: SessionStore,
    /// Every restore warning seen since the last `take_warnings`
    warnings: Arc<Mutex<Vec<RestoreWarning>>>,
}

impl SessionManager {
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            warnings: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.subscribe()
    }

    /// Open a tab with a generated title at the end of the tab order
    pub fn new_tab(&self) -> Result<usize> {
        Ok(self.store.create_session(None)?)
    }

    pub fn new_tab_titled(&self, title: String) -> Result<usize> {
        Ok(self.store.create_session(Some(title))?)
    }

    /// Close the tab at `index`, killing its shell.
    ///
    /// The index is checked at call time, so a tab already closed from
    /// elsewhere yields an index error instead of closing a neighbour.
    pub fn close_tab(&self, index: usize) -> Result<()> {
        Ok(self.store.close_session(index)?)
    }

    /// Rename the tab at `index`; an empty title is ignored
    pub fn rename_tab(&self, index: usize, title: String) -> Result<()> {
        Ok(self.store.rename_session(index, title)?)
    }

    /// Set the tab's color tag, or clear it with `None`.
    ///
    /// Black is the saved form of "no color", so `#000000` clears the tag
    /// too. Subscribers still see an `Updated` event.
    pub fn recolor_tab(&self, index: usize, color: Option<TabColor>) -> Result<()> {
        Ok(self.store.set_color(index, color)?)
    }

    pub fn session_count(&self) -> usize {
        self.store.count()
    }

    pub fn session_title_at(&self, index: usize) -> Result<String> {
        Ok(self.store.title_at(index)?)
    }

    /// All sessions in tab order
    pub fn list_sessions(&self) -> Vec<SessionRecord> {
        self.store.records()
    }

    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        self.store.snapshots()
    }

    /// Write every open tab to `path`, replacing the file atomically.
    ///
    /// Snapshots are taken under the store lock; encoding and disk I/O run
    /// after it is released. Live sessions are untouched whether or not the
    /// write succeeds. Returns the number of tabs written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let snapshots = self.store.snapshots();
        let bytes = codec::encode_to_vec(&snapshots)?;

        let file = StateFile::new(path);
        file.write_atomic(&bytes)?;

        tracing::info!(
            path = %file.path().display(),
            tab_count = snapshots.len(),
            "Saved sessions"
        );

        Ok(snapshots.len())
    }

    /// Reopen the tabs saved in `path`, after any already open.
    ///
    /// A missing file is a fresh start. A document that is not usable at all
    /// is also treated as a fresh start: nothing opens and the report carries
    /// a single `RestoreWarning::Format`. Problems with single entries become
    /// warnings and the remaining entries still load. Only a failure to read
    /// the file is an error.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadReport> {
        let file = StateFile::new(path);

        let bytes = match file.read()? {
            Some(bytes) => bytes,
            None => {
                tracing::info!(path = %file.path().display(), "No saved sessions");
                return Ok(LoadReport::default());
            }
        };

        let decoded = match codec::decode_slice(&bytes) {
            Ok(decoded) => decoded,
            Err(SessionError::Format(reason)) => {
                tracing::warn!(path = %file.path().display(), %reason, "Ignoring saved sessions");
                let warning = RestoreWarning::Format { reason };
                self.warnings.lock().push(warning.clone());
                return Ok(LoadReport {
                    restored: 0,
                    warnings: vec![warning],
                });
            }
            Err(e) => return Err(e),
        };

        let mut report = LoadReport {
            restored: 0,
            warnings: decoded.warnings,
        };

        for snapshot in &decoded.snapshots {
            match self.store.restore_session(snapshot) {
                Ok(restored) => {
                    report.restored += 1;
                    if let Some(e) = restored.navigation_error {
                        report.warnings.push(RestoreWarning::Navigation {
                            title: snapshot.title.clone(),
                            path: snapshot.working_directory.clone().unwrap_or_default(),
                            reason: e.to_string(),
                        });
                    }
                }
                Err(e) => report.warnings.push(RestoreWarning::Spawn {
                    title: snapshot.title.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        for warning in &report.warnings {
            tracing::warn!(%warning, "Restore warning");
        }
        self.warnings.lock().extend(report.warnings.iter().cloned());

        tracing::info!(
            path = %file.path().display(),
            restored = report.restored,
            warnings = report.warnings.len(),
            "Loaded sessions"
        );

        Ok(report)
    }

    /// Restore warnings accumulated so far
    pub fn warnings(&self) -> Vec<RestoreWarning> {
        self.warnings.lock().clone()
    }

    pub fn take_warnings(&self) -> Vec<RestoreWarning> {
        std::mem::take(&mut *self.warnings.lock())
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            warnings: Arc::clone(&self.warnings),
        }
    }
}
