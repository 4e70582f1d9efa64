//! Recording fakes for the terminal contract
//!
//! `FakeSpawner` hands out `FakeTerminal`s that never start a process; every
//! call the tab core makes is appended to a shared log for assertions.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TerminalError;
use crate::session::{TerminalSession, TerminalSpawner};
use crate::signal::Signal;
use crate::Result;

/// First pid handed out by a fresh spawner
pub const FIRST_FAKE_PID: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCall {
    Spawned { pid: u32 },
    NavigateTo { pid: u32, path: String },
    ResetDisplay { pid: u32 },
    Terminate { pid: u32, signal: Signal },
}

#[derive(Debug)]
struct FakeState {
    next_pid: u32,
    calls: Vec<TerminalCall>,
    failing_spawns: usize,
    missing_dirs: HashSet<String>,
    cwd_overrides: HashMap<u32, PathBuf>,
    failing_cwd: HashSet<u32>,
    home: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FakeSpawner {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSpawner {
    pub fn new() -> Self {
        Self::with_home("/home/user")
    }

    /// Spawner whose terminals start in `home`
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                next_pid: FIRST_FAKE_PID,
                calls: Vec::new(),
                failing_spawns: 0,
                missing_dirs: HashSet::new(),
                cwd_overrides: HashMap::new(),
                failing_cwd: HashSet::new(),
                home: home.into(),
            })),
        }
    }

    /// Make the next spawn fail with `TerminalError::Spawn`
    pub fn fail_next_spawn(&self) {
        self.state.lock().failing_spawns += 1;
    }

    /// Navigation into `dir` fails with `NoSuchDirectory`
    pub fn mark_missing(&self, dir: &str) {
        self.state.lock().missing_dirs.insert(dir.to_string());
    }

    /// Pretend the shell with `pid` changed directory on its own
    pub fn set_cwd(&self, pid: u32, dir: impl Into<PathBuf>) {
        self.state.lock().cwd_overrides.insert(pid, dir.into());
    }

    /// Working-directory queries for `pid` fail
    pub fn fail_cwd(&self, pid: u32) {
        self.state.lock().failing_cwd.insert(pid);
    }

    pub fn calls(&self) -> Vec<TerminalCall> {
        self.state.lock().calls.clone()
    }

    pub fn spawned(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TerminalCall::Spawned { pid } => Some(pid),
                _ => None,
            })
            .collect()
    }

    pub fn navigations(&self) -> Vec<(u32, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TerminalCall::NavigateTo { pid, path } => Some((pid, path)),
                _ => None,
            })
            .collect()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TerminalCall::Terminate { pid, .. } => Some(pid),
                _ => None,
            })
            .collect()
    }
}

impl Default for FakeSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalSpawner for FakeSpawner {
    fn spawn(&self) -> Result<Box<dyn TerminalSession>> {
        let mut state = self.state.lock();

        if state.failing_spawns > 0 {
            state.failing_spawns -= 1;
            return Err(TerminalError::Spawn("resource exhausted".to_string()));
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.calls.push(TerminalCall::Spawned { pid });

        Ok(Box::new(FakeTerminal {
            pid,
            cwd: state.home.clone(),
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
pub struct FakeTerminal {
    pid: u32,
    cwd: PathBuf,
    state: Arc<Mutex<FakeState>>,
}

impl TerminalSession for FakeTerminal {
    fn process_id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn current_working_directory(&self) -> Result<PathBuf> {
        let state = self.state.lock();
        if state.failing_cwd.contains(&self.pid) {
            return Err(TerminalError::Exited);
        }
        Ok(state
            .cwd_overrides
            .get(&self.pid)
            .cloned()
            .unwrap_or_else(|| self.cwd.clone()))
    }

    fn navigate_to(&mut self, path: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(TerminalCall::NavigateTo {
            pid: self.pid,
            path: path.to_string(),
        });

        if state.missing_dirs.contains(path) {
            return Err(TerminalError::NoSuchDirectory(path.to_string()));
        }

        state.cwd_overrides.remove(&self.pid);
        self.cwd = PathBuf::from(path);
        Ok(())
    }

    fn reset_display(&mut self) -> Result<()> {
        self.state
            .lock()
            .calls
            .push(TerminalCall::ResetDisplay { pid: self.pid });
        Ok(())
    }

    fn terminate(&mut self, signal: Signal) -> Result<()> {
        self.state.lock().calls.push(TerminalCall::Terminate {
            pid: self.pid,
            signal,
        });
        Ok(())
    }
}
