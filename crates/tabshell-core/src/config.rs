//! Host configuration

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tabshell_tabs::TitlePolicy;
use tabshell_terminal::{default_shell, Signal};

use crate::error::CoreError;
use crate::Result;

/// File the open tabs are saved to inside the data directory
pub const STATE_FILE_NAME: &str = "terminal_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the open tabs are saved
    pub state_file: PathBuf,
    /// Shell to run in new tabs; `$SHELL` when unset
    pub shell: Option<String>,
    /// Naming of tabs opened without a title
    pub title_policy: TitlePolicy,
    /// Signal sent to a tab's shell when the tab is closed
    pub close_signal: Signal,
    /// Open one tab at startup when nothing was restored
    pub open_tab_when_empty: bool,
    /// Directory new shells start in; the host's own when unset
    pub start_dir: Option<PathBuf>,
    /// Initial terminal size
    pub rows: u16,
    pub cols: u16,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            state_file: data_dir.join(STATE_FILE_NAME),
            shell: None,
            title_policy: TitlePolicy::Count,
            close_signal: Signal::Kill,
            open_tab_when_empty: true,
            start_dir: None,
            rows: 24,
            cols: 80,
        }
    }

    pub fn data_dir() -> PathBuf {
        ProjectDirs::from("org", "tabshell", "tabshell")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".tabshell"))
    }

    /// Default location of the configuration file itself
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("org", "tabshell", "tabshell")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from(".tabshell/config.json"))
    }

    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(CoreError::Config(format!(
                "terminal size must be non-zero, got {}x{}",
                self.cols, self.rows
            )));
        }
        if matches!(&self.shell, Some(shell) if shell.trim().is_empty()) {
            return Err(CoreError::Config("shell must not be empty".to_string()));
        }
        Ok(())
    }

    /// Like [`Config::load`], but a missing file yields the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Shell to spawn, resolving the default
    pub fn shell(&self) -> String {
        self.shell.clone().unwrap_or_else(default_shell)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new(PathBuf::from("/data"));
        assert_eq!(config.state_file, PathBuf::from("/data/terminal_config.json"));
        assert_eq!(config.title_policy, TitlePolicy::Count);
        assert_eq!(config.close_signal, Signal::Kill);
        assert!(config.open_tab_when_empty);
        assert!(!config.shell().is_empty());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "shell": "/bin/bash", "title_policy": "monotonic", "close_signal": "terminate" }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.shell(), "/bin/bash");
        assert_eq!(config.title_policy, TitlePolicy::Monotonic);
        assert_eq!(config.close_signal, Signal::Terminate);
        assert_eq!(config.rows, 24);
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "close_signal": "stop" }"#).unwrap();

        assert!(matches!(Config::load(&path), Err(CoreError::Serialization(_))));
    }

    #[test]
    fn test_zero_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "rows": 0 }"#).unwrap();

        assert!(matches!(Config::load(&path), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        let mut config = Config::new(dir.path().to_path_buf());
        config.start_dir = Some(PathBuf::from("/srv"));
        config.close_signal = Signal::Hangup;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
