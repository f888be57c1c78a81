//! Service lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states a managed service moves through
///
/// Sequences drive services between these states; `TransitionTo` sequences
/// name one of them as their target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ServiceState {
    /// Service is not running
    #[default]
    Stopped,
    /// Service process is being brought up
    Starting,
    /// Service is up but not yet serving
    Standby,
    /// Service is running normally
    Running,
    /// Service is shutting down
    Stopping,
    /// Service has failed
    Failed,
}

impl ServiceState {
    /// Checks if the service is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::Stopped | ServiceState::Failed)
    }

    /// Checks if the service is active
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ServiceState::Starting | ServiceState::Standby | ServiceState::Running
        )
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Stopped => write!(f, "stopped"),
            ServiceState::Starting => write!(f, "starting"),
            ServiceState::Standby => write!(f, "standby"),
            ServiceState::Running => write!(f, "running"),
            ServiceState::Stopping => write!(f, "stopping"),
            ServiceState::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_states() {
        assert!(ServiceState::Stopped.is_terminal());
        assert!(ServiceState::Failed.is_terminal());
        assert!(!ServiceState::Running.is_terminal());

        assert!(ServiceState::Running.is_active());
        assert!(ServiceState::Standby.is_active());
        assert!(ServiceState::Starting.is_active());
        assert!(!ServiceState::Stopped.is_active());
    }
}
