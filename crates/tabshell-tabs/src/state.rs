//! Session Lifecycle
//!
//! ```text
//! Created
//!   ↓ registered in the store
//! Active
//!   ↓ close requested, termination signal sent
//! Closing
//!   ↓ record removed
//! Closed
//! ```
//!
//! There is no way back from `Closed`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Record built, terminal spawned, not yet visible in the store
    Created,
    /// Listed in the store and usable
    Active,
    /// Termination signal sent, removal in progress
    Closing,
    /// Removed from the store
    Closed,
}

impl SessionState {
    /// Check if transition to another state is valid
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        match (self, target) {
            (SessionState::Created, SessionState::Active) => true,
            (SessionState::Active, SessionState::Closing) => true,
            (SessionState::Closing, SessionState::Closed) => true,
            // Same state is a no-op, except nothing ever re-enters Closed
            (SessionState::Closed, _) => false,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(SessionState::Created),
            "active" => Ok(SessionState::Active),
            "closing" => Ok(SessionState::Closing),
            "closed" => Ok(SessionState::Closed),
            _ => Err(format!("Unknown session state: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(SessionState::Created.can_transition_to(SessionState::Active));
        assert!(SessionState::Active.can_transition_to(SessionState::Closing));
        assert!(SessionState::Closing.can_transition_to(SessionState::Closed));
        assert!(SessionState::Active.can_transition_to(SessionState::Active));
    }

    #[test]
    fn test_invalid_transitions() {
        // No skipping the termination step
        assert!(!SessionState::Active.can_transition_to(SessionState::Closed));
        assert!(!SessionState::Created.can_transition_to(SessionState::Closing));
        // Nothing comes back
        assert!(!SessionState::Closed.can_transition_to(SessionState::Active));
        assert!(!SessionState::Closed.can_transition_to(SessionState::Closed));
        assert!(!SessionState::Closing.can_transition_to(SessionState::Active));
    }

    #[test]
    fn test_round_trip_str() {
        for state in [
            SessionState::Created,
            SessionState::Active,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            assert_eq!(state.as_str().parse::<SessionState>().unwrap(), state);
        }
    }
}
