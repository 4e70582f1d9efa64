//! Host facade
//!
//! Wires the configured shell, the session store and the state file
//! together. `initialize` restores what the previous run left open and
//! `shutdown` saves it again; neither lets a storage problem escape.

use std::sync::Arc;
use tokio::sync::mpsc;

use tabshell_session::{LoadReport, RestoreWarning, SessionManager};
use tabshell_tabs::SessionStore;
use tabshell_terminal::{PtySpawner, TerminalOutput, TerminalSpawner};

use crate::config::Config;
use crate::Result;

pub struct Host {
    /// Configuration
    config: Config,
    /// Session manager (includes the session store)
    sessions: SessionManager,
}

impl Host {
    /// Host running the configured shell in PTYs, discarding their output
    pub fn new(config: Config) -> Self {
        let spawner = pty_spawner(&config);
        Self::with_spawner(config, Arc::new(spawner))
    }

    /// Host whose shells' output is forwarded to the returned receiver
    pub fn with_output(config: Config) -> (Self, mpsc::UnboundedReceiver<TerminalOutput>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawner = pty_spawner(&config).with_output(tx);
        (Self::with_spawner(config, Arc::new(spawner)), rx)
    }

    pub fn with_spawner(config: Config, spawner: Arc<dyn TerminalSpawner>) -> Self {
        let store = SessionStore::new(spawner)
            .with_title_policy(config.title_policy)
            .with_close_signal(config.close_signal);

        Self {
            config,
            sessions: SessionManager::new(store),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Restore the tabs saved by the previous run.
    ///
    /// An unreadable or corrupt state file counts as no prior session and is
    /// reported in the returned warnings. Fails only if the initial tab for
    /// an empty start cannot be spawned.
    pub fn initialize(&self) -> Result<LoadReport> {
        let state_file = &self.config.state_file;

        let report = match self.sessions.load(state_file) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(path = %state_file.display(), error = %e, "Could not read saved sessions");
                LoadReport {
                    restored: 0,
                    warnings: vec![RestoreWarning::Format {
                        reason: e.to_string(),
                    }],
                }
            }
        };

        if self.sessions.session_count() == 0 && self.config.open_tab_when_empty {
            self.sessions.new_tab()?;
        }

        tracing::info!(
            restored = report.restored,
            open = self.sessions.session_count(),
            "Host initialized"
        );

        Ok(report)
    }

    /// Save the open tabs to the configured state file
    pub fn save(&self) -> Result<usize> {
        Ok(self.sessions.save(&self.config.state_file)?)
    }

    /// Save, then close every shell. A failed save is logged and the
    /// shells are closed anyway. Returns whether the save succeeded.
    pub fn shutdown(&self) -> bool {
        let saved = match self.save() {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.config.state_file.display(),
                    error = %e,
                    "Failed to save sessions on shutdown"
                );
                false
            }
        };

        let closed = self.sessions.store().close_all();
        tracing::info!(closed, saved, "Host shut down");

        saved
    }
}

fn pty_spawner(config: &Config) -> PtySpawner {
    let spawner = PtySpawner::new(config.shell()).with_size(config.rows, config.cols);
    match &config.start_dir {
        Some(dir) => spawner.with_start_dir(dir),
        None => spawner,
    }
}
