//! PTY-backed shells

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::TerminalError;
use crate::session::{TerminalSession, TerminalSpawner};
use crate::signal::Signal;
use crate::Result;

/// Raw bytes produced by a shell
#[derive(Debug, Clone)]
pub struct TerminalOutput {
    pub pid: Option<u32>,
    pub data: Vec<u8>,
}

/// Shell used when none is configured: `$SHELL`, else the platform default.
pub fn default_shell() -> String {
    if let Ok(shell) = std::env::var("SHELL") {
        if !shell.is_empty() {
            return shell;
        }
    }

    if cfg!(windows) {
        "cmd.exe".to_string()
    } else {
        "/bin/sh".to_string()
    }
}

/// Spawns the configured shell inside a fresh pseudo-terminal.
pub struct PtySpawner {
    shell: String,
    rows: u16,
    cols: u16,
    start_dir: Option<PathBuf>,
    output_tx: Option<mpsc::UnboundedSender<TerminalOutput>>,
}

impl PtySpawner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            rows: 24,
            cols: 80,
            start_dir: None,
            output_tx: None,
        }
    }

    pub fn with_size(mut self, rows: u16, cols: u16) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Directory new shells start in (defaults to the process's own)
    pub fn with_start_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.start_dir = Some(dir.into());
        self
    }

    /// Forward shell output to `tx`. Without a receiver output is drained and dropped.
    pub fn with_output(mut self, tx: mpsc::UnboundedSender<TerminalOutput>) -> Self {
        self.output_tx = Some(tx);
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for PtySpawner {
    fn default() -> Self {
        Self::new(default_shell())
    }
}

impl PtySpawner {
    /// Spawn a shell, keeping the concrete terminal type
    pub fn spawn_pty(&self) -> Result<PtyTerminal> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows: self.rows,
                cols: self.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TerminalError::Spawn(format!("failed to create PTY: {}", e)))?;

        let start_dir = match &self.start_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let mut cmd = CommandBuilder::new(&self.shell);
        cmd.cwd(&start_dir);
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| TerminalError::Spawn(format!("failed to spawn {}: {}", self.shell, e)))?;
        // The child holds its own copy of the slave side
        drop(pair.slave);

        let pid = child.process_id();
        let killer = child.clone_killer();

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| TerminalError::Spawn(format!("failed to get PTY reader: {}", e)))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| TerminalError::Spawn(format!("failed to get PTY writer: {}", e)))?;

        let exited = Arc::new(AtomicBool::new(false));
        start_reader_thread(reader, child, pid, self.output_tx.clone(), Arc::clone(&exited));

        info!(shell = %self.shell, pid = ?pid, cwd = %start_dir.display(), "Spawned shell");

        Ok(PtyTerminal {
            master: pair.master,
            writer,
            killer,
            pid,
            last_directory: start_dir,
            pending_directory: Mutex::new(None),
            exited,
        })
    }
}

impl TerminalSpawner for PtySpawner {
    fn spawn(&self) -> Result<Box<dyn TerminalSession>> {
        Ok(Box::new(self.spawn_pty()?))
    }
}

/// Drain PTY output until EOF, then reap the child.
fn start_reader_thread(
    mut reader: Box<dyn Read + Send>,
    mut child: Box<dyn portable_pty::Child + Send + Sync>,
    pid: Option<u32>,
    output_tx: Option<mpsc::UnboundedSender<TerminalOutput>>,
    exited: Arc<AtomicBool>,
) {
    std::thread::spawn(move || {
        let mut buffer = [0u8; 4096];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => {
                    debug!(pid = ?pid, "PTY EOF");
                    break;
                }
                Ok(n) => {
                    if let Some(tx) = &output_tx {
                        let _ = tx.send(TerminalOutput {
                            pid,
                            data: buffer[..n].to_vec(),
                        });
                    }
                }
                Err(e) => {
                    if e.kind() != std::io::ErrorKind::Interrupted {
                        debug!(pid = ?pid, error = %e, "PTY read error");
                        break;
                    }
                }
            }
        }

        match child.wait() {
            Ok(status) => info!(pid = ?pid, code = status.exit_code(), "Shell exited"),
            Err(e) => warn!(pid = ?pid, error = %e, "Failed to wait for shell"),
        }

        exited.store(true, Ordering::Release);
    });
}

/// A `cd` written to the shell that it may not have run yet
#[derive(Debug)]
struct PendingDirectory {
    target: PathBuf,
    /// Live directory when the command was sent
    origin: Option<PathBuf>,
}

/// A shell running in a pseudo-terminal.
pub struct PtyTerminal {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    pid: Option<u32>,
    /// Directory the shell started in or was last sent to
    last_directory: PathBuf,
    /// Reported as the working directory until the shell leaves `origin`
    pending_directory: Mutex<Option<PendingDirectory>>,
    exited: Arc<AtomicBool>,
}

impl PtyTerminal {
    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    pub fn resize(&self, rows: u16, cols: u16) -> Result<()> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| TerminalError::Io(std::io::Error::other(e.to_string())))
    }

    fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\r")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl TerminalSession for PtyTerminal {
    fn process_id(&self) -> Option<u32> {
        self.pid
    }

    fn current_working_directory(&self) -> Result<PathBuf> {
        if self.has_exited() {
            return Err(TerminalError::Exited);
        }

        let live = self.pid.and_then(live_cwd);

        let mut pending = self.pending_directory.lock();
        if let Some(p) = pending.as_ref() {
            match &live {
                // The shell reached the target, or moved on somewhere else
                Some(dir) if *dir == p.target || Some(dir) != p.origin.as_ref() => {
                    *pending = None;
                }
                _ => return Ok(p.target.clone()),
            }
        }

        Ok(live.unwrap_or_else(|| self.last_directory.clone()))
    }

    fn navigate_to(&mut self, path: &str) -> Result<()> {
        let target = Path::new(path);
        if target.is_absolute() && !target.is_dir() {
            return Err(TerminalError::NoSuchDirectory(path.to_string()));
        }

        let origin = self.pid.and_then(live_cwd);
        let base = self
            .current_working_directory()
            .unwrap_or_else(|_| self.last_directory.clone());

        self.send_line(&cd_command(path))?;

        let resolved = base.join(target);
        if resolved.is_dir() {
            let resolved = std::fs::canonicalize(&resolved).unwrap_or(resolved);
            *self.pending_directory.lock() = Some(PendingDirectory {
                target: resolved.clone(),
                origin,
            });
            self.last_directory = resolved;
        } else {
            debug!(pid = ?self.pid, path, "cd target not found, keeping last directory");
        }

        Ok(())
    }

    fn reset_display(&mut self) -> Result<()> {
        if cfg!(windows) {
            self.send_line("cls")
        } else {
            self.send_line("clear")
        }
    }

    fn terminate(&mut self, signal: Signal) -> Result<()> {
        if self.has_exited() {
            debug!(pid = ?self.pid, "Shell already exited, skipping {}", signal);
            return Ok(());
        }

        #[cfg(unix)]
        {
            if let Some(pid) = self.pid {
                return signal_process_group(pid, signal);
            }
        }

        self.killer.kill()?;
        Ok(())
    }
}

/// Signal the shell's process group. portable-pty starts the shell as a
/// session leader, so this reaches anything it launched as well.
#[cfg(unix)]
fn signal_process_group(pid: u32, signal: Signal) -> Result<()> {
    if pid == 0 || pid > i32::MAX as u32 {
        warn!(pid, "PID is 0 or exceeds i32::MAX, cannot send signal");
        return Ok(());
    }

    let rc = unsafe { libc::kill(-(pid as i32), signal.as_raw()) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            debug!(pid, "Process group already gone");
            return Ok(());
        }
        return Err(TerminalError::Signal {
            pid,
            signal,
            source: err,
        });
    }

    debug!(pid, signal = %signal, "Sent signal");
    Ok(())
}

#[cfg(target_os = "linux")]
fn live_cwd(pid: u32) -> Option<PathBuf> {
    std::fs::read_link(format!("/proc/{}/cwd", pid)).ok()
}

#[cfg(not(target_os = "linux"))]
fn live_cwd(_pid: u32) -> Option<PathBuf> {
    None
}

/// Shell command that changes into `path`, quoted for the platform shell.
fn cd_command(path: &str) -> String {
    if cfg!(windows) {
        format!("cd /d \"{}\"", path)
    } else {
        format!("cd -- '{}'", path.replace('\'', r"'\''"))
    }
}
