//! Termination signals

use serde::{Deserialize, Serialize};

/// Signal delivered to a shell when its tab is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// SIGHUP: the controlling terminal went away
    Hangup,
    /// SIGTERM: polite request to exit
    Terminate,
    /// SIGKILL: cannot be caught or ignored
    #[default]
    Kill,
}

impl Signal {
    #[cfg(unix)]
    pub fn as_raw(&self) -> libc::c_int {
        match self {
            Signal::Hangup => libc::SIGHUP,
            Signal::Terminate => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Hangup => "hangup",
            Signal::Terminate => "terminate",
            Signal::Kill => "kill",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hangup" | "hup" | "sighup" => Ok(Signal::Hangup),
            "terminate" | "term" | "sigterm" => Ok(Signal::Terminate),
            "kill" | "sigkill" => Ok(Signal::Kill),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("SIGKILL".parse::<Signal>().unwrap(), Signal::Kill);
        assert_eq!("term".parse::<Signal>().unwrap(), Signal::Terminate);
        assert_eq!("hup".parse::<Signal>().unwrap(), Signal::Hangup);
        assert!("stop".parse::<Signal>().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_raw_values() {
        assert_eq!(Signal::Kill.as_raw(), 9);
        assert_eq!(Signal::Terminate.as_raw(), 15);
        assert_eq!(Signal::Hangup.as_raw(), 1);
    }
}
