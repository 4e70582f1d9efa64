//! Session Store
//!
//! Ordered sessions, each record paired with the terminal it describes.
//! Every mutation happens under one lock so records and terminals never
//! drift out of alignment.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

use tabshell_terminal::{Signal, TerminalError, TerminalSession, TerminalSpawner};

use crate::color::TabColor;
use crate::error::TabError;
use crate::events::SessionEvent;
use crate::record::{SessionId, SessionRecord, SessionSnapshot};
use crate::title::TitlePolicy;
use crate::Result;

const EVENT_CAPACITY: usize = 64;

struct Entry {
    record: SessionRecord,
    terminal: Box<dyn TerminalSession>,
}

struct StoreInner {
    /// Tab order; `entries[i]` is the session at index `i`
    entries: Vec<Entry>,
    /// Sessions ever created, for monotonic titles
    created: u64,
}

impl StoreInner {
    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(TabError::IndexOutOfRange {
                index,
                count: self.entries.len(),
            });
        }
        Ok(())
    }
}

/// Outcome of replaying one saved session
#[derive(Debug)]
pub struct RestoredSession {
    pub index: usize,
    pub id: SessionId,
    /// Set when the saved directory could not be entered; the session
    /// stays in its default directory
    pub navigation_error: Option<TerminalError>,
}

pub struct SessionStore {
    inner: Arc<Mutex<StoreInner>>,
    spawner: Arc<dyn TerminalSpawner>,
    title_policy: TitlePolicy,
    close_signal: Signal,
    events_tx: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new(spawner: Arc<dyn TerminalSpawner>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                entries: Vec::new(),
                created: 0,
            })),
            spawner,
            title_policy: TitlePolicy::default(),
            close_signal: Signal::default(),
            events_tx,
        }
    }

    pub fn with_title_policy(mut self, policy: TitlePolicy) -> Self {
        self.title_policy = policy;
        self
    }

    pub fn with_close_signal(mut self, signal: Signal) -> Self {
        self.close_signal = signal;
        self
    }

    /// Subscribe to added/removed/updated notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events_tx.subscribe()
    }

    /// Open a new session at the end of the tab order.
    ///
    /// A missing or empty title gets a generated "Terminal N". If the shell
    /// cannot be spawned nothing is added.
    pub fn create_session(&self, title: Option<String>) -> Result<usize> {
        let (index, id) = {
            let mut inner = self.inner.lock();
            self.push_session(&mut inner, title)?
        };

        self.publish(SessionEvent::Added { id, index });
        Ok(index)
    }

    /// Open a session from a snapshot: spawn it, send it to the saved
    /// directory (clearing the display afterwards), then apply the color.
    ///
    /// Only a spawn failure is an error. A directory that cannot be entered
    /// is reported in the result and the session is kept.
    pub fn restore_session(&self, snapshot: &SessionSnapshot) -> Result<RestoredSession> {
        let restored = {
            let mut inner = self.inner.lock();
            let (index, id) = self.push_session(&mut inner, Some(snapshot.title.clone()))?;
            let entry = &mut inner.entries[index];

            let mut navigation_error = None;
            if let Some(path) = &snapshot.working_directory {
                match entry.terminal.navigate_to(path) {
                    Ok(()) => {
                        entry.record.remember_directory(path.clone());
                        if let Err(e) = entry.terminal.reset_display() {
                            tracing::debug!(session_id = %id, error = %e, "Failed to reset display");
                        }
                    }
                    Err(e) => navigation_error = Some(e),
                }
            }

            entry.record.set_color(snapshot.color);

            RestoredSession {
                index,
                id,
                navigation_error,
            }
        };

        self.publish(SessionEvent::Added {
            id: restored.id.clone(),
            index: restored.index,
        });

        Ok(restored)
    }

    /// Close the session at `index`.
    ///
    /// The shell is signalled without waiting for it to exit; a failed
    /// signal is logged and the session is removed regardless. Later
    /// sessions move down one index.
    pub fn close_session(&self, index: usize) -> Result<()> {
        let record = {
            let mut inner = self.inner.lock();
            inner.check_index(index)?;

            let mut entry = inner.entries.remove(index);
            self.terminate(&mut entry)?;
            entry.record
        };

        tracing::info!(session_id = %record.id, index, title = %record.title, "Closed session");
        self.publish(SessionEvent::Removed {
            id: record.id,
            index,
        });

        Ok(())
    }

    /// Close every session, last first
    pub fn close_all(&self) -> usize {
        let removed: Vec<SessionRecord> = {
            let mut inner = self.inner.lock();
            let mut removed = Vec::with_capacity(inner.entries.len());
            while let Some(mut entry) = inner.entries.pop() {
                if let Err(e) = self.terminate(&mut entry) {
                    tracing::warn!(session_id = %entry.record.id, error = %e, "Failed to close session");
                }
                removed.push(entry.record);
            }
            removed
        };

        let count = removed.len();
        for (i, record) in removed.into_iter().enumerate() {
            self.publish(SessionEvent::Removed {
                id: record.id,
                index: count - 1 - i,
            });
        }

        count
    }

    /// Rename the session at `index`. An empty title leaves it unchanged.
    pub fn rename_session(&self, index: usize, title: String) -> Result<()> {
        let changed = {
            let mut inner = self.inner.lock();
            inner.check_index(index)?;

            let record = &mut inner.entries[index].record;
            record.rename(title).then(|| record.id.clone())
        };

        if let Some(id) = changed {
            self.publish(SessionEvent::Updated { id, index });
        }

        Ok(())
    }

    /// Set or clear (`None`) the color tag of the session at `index`
    pub fn set_color(&self, index: usize, color: Option<TabColor>) -> Result<()> {
        let id = {
            let mut inner = self.inner.lock();
            inner.check_index(index)?;

            let record = &mut inner.entries[index].record;
            record.set_color(color);
            record.id.clone()
        };

        self.publish(SessionEvent::Updated { id, index });
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn record_at(&self, index: usize) -> Result<SessionRecord> {
        let inner = self.inner.lock();
        inner.check_index(index)?;
        Ok(inner.entries[index].record.clone())
    }

    pub fn title_at(&self, index: usize) -> Result<String> {
        let inner = self.inner.lock();
        inner.check_index(index)?;
        Ok(inner.entries[index].record.title.clone())
    }

    pub fn process_id_at(&self, index: usize) -> Result<Option<u32>> {
        let inner = self.inner.lock();
        inner.check_index(index)?;
        Ok(inner.entries[index].terminal.process_id())
    }

    /// All records in tab order
    pub fn records(&self) -> Vec<SessionRecord> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(|e| e.record.clone())
            .collect()
    }

    /// Current index of a session, if it is still open
    pub fn index_of(&self, id: &SessionId) -> Option<usize> {
        self.inner
            .lock()
            .entries
            .iter()
            .position(|e| &e.record.id == id)
    }

    pub fn record_by_id(&self, id: &SessionId) -> Result<SessionRecord> {
        self.inner
            .lock()
            .entries
            .iter()
            .find(|e| &e.record.id == id)
            .map(|e| e.record.clone())
            .ok_or_else(|| TabError::NotFound(id.to_string()))
    }

    /// Capture every session for saving, asking each shell where it is.
    ///
    /// A shell that cannot answer falls back to the session's last known
    /// directory.
    pub fn snapshots(&self) -> Vec<SessionSnapshot> {
        let inner = self.inner.lock();

        inner
            .entries
            .iter()
            .map(|entry| {
                let working_directory = match entry.terminal.current_working_directory() {
                    Ok(dir) => Some(dir.to_string_lossy().into_owned()),
                    Err(e) => {
                        tracing::debug!(
                            session_id = %entry.record.id,
                            error = %e,
                            "Working directory unavailable, using last known"
                        );
                        entry.record.working_directory.clone()
                    }
                };

                SessionSnapshot {
                    title: entry.record.title.clone(),
                    working_directory,
                    color: entry.record.color,
                }
            })
            .collect()
    }

    fn push_session(
        &self,
        inner: &mut StoreInner,
        title: Option<String>,
    ) -> Result<(usize, SessionId)> {
        let terminal = self.spawner.spawn().map_err(TabError::Spawn)?;

        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.title_policy.title_for(inner.entries.len(), inner.created));

        let mut record = SessionRecord::new(title);
        record.activate()?;

        let id = record.id.clone();
        tracing::info!(
            session_id = %id,
            title = %record.title,
            pid = ?terminal.process_id(),
            "Created session"
        );

        inner.entries.push(Entry { record, terminal });
        inner.created += 1;

        Ok((inner.entries.len() - 1, id))
    }

    fn terminate(&self, entry: &mut Entry) -> Result<()> {
        entry.record.begin_close()?;

        if let Err(e) = entry.terminal.terminate(self.close_signal) {
            tracing::warn!(
                session_id = %entry.record.id,
                pid = ?entry.terminal.process_id(),
                error = %e,
                "Failed to signal shell"
            );
        }

        entry.record.finish_close()
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            spawner: Arc::clone(&self.spawner),
            title_policy: self.title_policy,
            close_signal: self.close_signal,
            events_tx: self.events_tx.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabshell_terminal::testing::{FakeSpawner, TerminalCall, FIRST_FAKE_PID};

    fn store() -> (SessionStore, FakeSpawner) {
        let spawner = FakeSpawner::new();
        (SessionStore::new(Arc::new(spawner.clone())), spawner)
    }

    fn titles(store: &SessionStore) -> Vec<String> {
        store.records().into_iter().map(|r| r.title).collect()
    }

    #[test]
    fn test_create_appends_with_default_titles() {
        let (store, spawner) = store();

        assert_eq!(store.create_session(None).unwrap(), 0);
        assert_eq!(store.create_session(None).unwrap(), 1);
        assert_eq!(store.create_session(Some("Logs".to_string())).unwrap(), 2);

        assert_eq!(titles(&store), vec!["Terminal 1", "Terminal 2", "Logs"]);
        assert_eq!(spawner.spawned().len(), 3);
        assert!(store
            .records()
            .iter()
            .all(|r| r.state == crate::SessionState::Active));
    }

    #[test]
    fn test_spawn_failure_adds_nothing() {
        let (store, spawner) = store();
        store.create_session(None).unwrap();

        spawner.fail_next_spawn();
        let err = store.create_session(None).unwrap_err();
        assert!(matches!(err, TabError::Spawn(_)));
        assert_eq!(store.count(), 1);

        // The next spawn works again
        store.create_session(None).unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_close_shifts_indices() {
        let (store, spawner) = store();
        for title in ["A", "B", "C"] {
            store.create_session(Some(title.to_string())).unwrap();
        }
        let b_id = store.record_at(1).unwrap().id;

        store.close_session(0).unwrap();

        assert_eq!(titles(&store), vec!["B", "C"]);
        assert_eq!(store.index_of(&b_id), Some(0));
        assert_eq!(store.record_at(0).unwrap().id, b_id);
        assert_eq!(spawner.terminated(), vec![FIRST_FAKE_PID]);
    }

    #[test]
    fn test_close_out_of_range_changes_nothing() {
        let (store, spawner) = store();
        for title in ["A", "B"] {
            store.create_session(Some(title.to_string())).unwrap();
        }
        let before: Vec<SessionId> = store.records().into_iter().map(|r| r.id).collect();

        let err = store.close_session(2).unwrap_err();
        assert!(matches!(err, TabError::IndexOutOfRange { index: 2, count: 2 }));

        let after: Vec<SessionId> = store.records().into_iter().map(|r| r.id).collect();
        assert_eq!(before, after);
        assert!(spawner.terminated().is_empty());
    }

    #[test]
    fn test_count_tracks_creates_minus_closes() {
        let (store, _) = store();
        let mut expected = 0usize;

        for step in 0..20 {
            if step % 3 == 2 && expected > 0 {
                store.close_session(step % expected).unwrap();
                expected -= 1;
            } else {
                store.create_session(None).unwrap();
                expected += 1;
            }
            assert_eq!(store.count(), expected);
        }
    }

    #[test]
    fn test_default_titles_follow_policy() {
        let (store, _) = store();
        store.create_session(None).unwrap();
        store.create_session(None).unwrap();
        store.close_session(0).unwrap();
        store.create_session(None).unwrap();
        // Count-based naming reuses "Terminal 2"
        assert_eq!(titles(&store), vec!["Terminal 2", "Terminal 2"]);

        let spawner = FakeSpawner::new();
        let store = SessionStore::new(Arc::new(spawner)).with_title_policy(TitlePolicy::Monotonic);
        store.create_session(None).unwrap();
        store.create_session(None).unwrap();
        store.close_session(0).unwrap();
        store.create_session(None).unwrap();
        assert_eq!(titles(&store), vec!["Terminal 2", "Terminal 3"]);
    }

    #[test]
    fn test_rename_and_color() {
        let (store, _) = store();
        store.create_session(None).unwrap();

        store.rename_session(0, String::new()).unwrap();
        assert_eq!(store.title_at(0).unwrap(), "Terminal 1");

        store.rename_session(0, "Server".to_string()).unwrap();
        assert_eq!(store.title_at(0).unwrap(), "Server");

        let red = TabColor::rgb(255, 0, 0);
        store.set_color(0, Some(red)).unwrap();
        assert_eq!(store.record_at(0).unwrap().color, Some(red));
        store.set_color(0, None).unwrap();
        assert_eq!(store.record_at(0).unwrap().color, None);

        assert!(matches!(
            store.rename_session(3, "x".to_string()),
            Err(TabError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            store.set_color(3, Some(red)),
            Err(TabError::IndexOutOfRange { .. })
        ));
        assert!(store.record_at(1).is_err());
    }

    #[test]
    fn test_restore_session_navigates_and_colors() {
        let (store, spawner) = store();
        let green = TabColor::rgb(0, 255, 0);

        let plain = store.restore_session(&SessionSnapshot::new("A")).unwrap();
        let placed = store
            .restore_session(&SessionSnapshot::new("B").with_directory("/tmp").with_color(green))
            .unwrap();

        assert_eq!((plain.index, placed.index), (0, 1));
        assert!(plain.navigation_error.is_none());
        assert!(placed.navigation_error.is_none());
        assert_eq!(
            spawner.navigations(),
            vec![(FIRST_FAKE_PID + 1, "/tmp".to_string())]
        );

        let b = store.record_at(1).unwrap();
        assert_eq!(b.title, "B");
        assert_eq!(b.color, Some(green));
        assert_eq!(b.working_directory.as_deref(), Some("/tmp"));
    }

    #[test]
    fn test_restore_keeps_session_when_directory_is_gone() {
        let (store, spawner) = store();
        spawner.mark_missing("/gone");

        let restored = store
            .restore_session(&SessionSnapshot::new("A").with_directory("/gone"))
            .unwrap();

        assert!(restored.navigation_error.is_some());
        assert_eq!(store.count(), 1);
        assert!(store.record_at(0).unwrap().working_directory.is_none());
    }

    #[test]
    fn test_snapshots_query_live_directory() {
        let (store, spawner) = store();
        store
            .restore_session(&SessionSnapshot::new("A").with_directory("/srv"))
            .unwrap();
        store.create_session(Some("B".to_string())).unwrap();

        spawner.set_cwd(FIRST_FAKE_PID + 1, "/var/log");
        // A shell that cannot answer falls back to where it was sent
        spawner.fail_cwd(FIRST_FAKE_PID);

        let snaps = store.snapshots();
        assert_eq!(snaps[0].working_directory.as_deref(), Some("/srv"));
        assert_eq!(snaps[1].working_directory.as_deref(), Some("/var/log"));
    }

    #[test]
    fn test_events() {
        let (store, _) = store();
        let mut rx = store.subscribe();

        store.create_session(None).unwrap();
        let id = store.record_at(0).unwrap().id;
        store.rename_session(0, "x".to_string()).unwrap();
        // An ignored rename publishes nothing
        store.rename_session(0, String::new()).unwrap();
        store.close_session(0).unwrap();

        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Added {
                id: id.clone(),
                index: 0
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::Updated {
                id: id.clone(),
                index: 0
            }
        );
        let removed = rx.try_recv().unwrap();
        assert_eq!(removed.id(), &id);
        assert_eq!(removed, SessionEvent::Removed { id, index: 0 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_restore_resets_display_only_after_navigation() {
        let (store, spawner) = store();
        spawner.mark_missing("/gone");

        store
            .restore_session(&SessionSnapshot::new("A").with_directory("/srv"))
            .unwrap();
        store
            .restore_session(&SessionSnapshot::new("B").with_directory("/gone"))
            .unwrap();
        store.restore_session(&SessionSnapshot::new("C")).unwrap();

        let a = FIRST_FAKE_PID;
        let b = FIRST_FAKE_PID + 1;
        let c = FIRST_FAKE_PID + 2;
        assert_eq!(
            spawner.calls(),
            vec![
                TerminalCall::Spawned { pid: a },
                TerminalCall::NavigateTo {
                    pid: a,
                    path: "/srv".to_string()
                },
                TerminalCall::ResetDisplay { pid: a },
                TerminalCall::Spawned { pid: b },
                TerminalCall::NavigateTo {
                    pid: b,
                    path: "/gone".to_string()
                },
                TerminalCall::Spawned { pid: c },
            ]
        );
    }

    #[test]
    fn test_close_sends_configured_signal() {
        let spawner = FakeSpawner::new();
        let store =
            SessionStore::new(Arc::new(spawner.clone())).with_close_signal(Signal::Terminate);
        store.create_session(None).unwrap();
        store.create_session(None).unwrap();

        store.close_session(1).unwrap();
        store.close_all();

        let signals: Vec<(u32, Signal)> = spawner
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                TerminalCall::Terminate { pid, signal } => Some((pid, signal)),
                _ => None,
            })
            .collect();
        assert_eq!(
            signals,
            vec![
                (FIRST_FAKE_PID + 1, Signal::Terminate),
                (FIRST_FAKE_PID, Signal::Terminate),
            ]
        );
    }

    #[test]
    fn test_ids_survive_reindexing() {
        let (store, _) = store();
        for title in ["A", "B", "C"] {
            store.create_session(Some(title.to_string())).unwrap();
        }
        let c_id = store.record_at(2).unwrap().id;
        let a_id = store.record_at(0).unwrap().id;
        assert_eq!(store.process_id_at(2).unwrap(), Some(FIRST_FAKE_PID + 2));

        store.close_session(0).unwrap();
        store.close_session(0).unwrap();

        let c = store.record_by_id(&c_id).unwrap();
        assert_eq!(c.title, "C");
        assert_eq!(store.index_of(&c_id), Some(0));
        assert_eq!(store.process_id_at(0).unwrap(), Some(FIRST_FAKE_PID + 2));

        assert!(matches!(store.record_by_id(&a_id), Err(TabError::NotFound(_))));
        assert_eq!(store.index_of(&a_id), None);
        assert!(matches!(
            store.process_id_at(1),
            Err(TabError::IndexOutOfRange { index: 1, count: 1 })
        ));
    }

    #[test]
    fn test_close_all() {
        let (store, spawner) = store();
        for _ in 0..3 {
            store.create_session(None).unwrap();
        }

        assert_eq!(store.close_all(), 3);
        assert!(store.is_empty());
        assert_eq!(spawner.terminated().len(), 3);
    }

    #[test]
    fn test_concurrent_creates_and_closes() {
        let (store, _) = store();
        for _ in 0..8 {
            store.create_session(None).unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        store.create_session(None).unwrap();
                    } else {
                        // Index 0 always exists: at most two closes race eight sessions
                        store.close_session(0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.count(), 8);
        assert_eq!(store.records().len(), store.snapshots().len());
    }
}
