//! Finite State Machine for container launch

use serde::{Deserialize, Serialize};

/// Launch state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchState {
    /// Looking for a container already holding the identity
    Probing,

    /// Stopping and removing the previous container
    Reclaiming,

    /// Creating the new container
    Starting,

    /// Waiting for the running state
    Confirming,

    /// Observed running
    Running,

    /// Launch failed
    Failed,
}

impl LaunchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LaunchState::Running | LaunchState::Failed)
    }
}

/// Launch event
#[derive(Debug, Clone)]
pub enum LaunchEvent {
    /// No container holds the identity
    NotFound,

    /// A container holds the identity
    Found(String),

    /// Previous container stopped and removed
    Reclaimed,

    /// New container created
    Started(String),

    /// Running state observed
    Ready,

    /// Timeout reached before the running state
    TimedOut,

    /// A runtime call failed
    Fail(String),
}

/// Launch FSM
#[derive(Debug, Clone)]
pub struct LaunchFsm {
    state: LaunchState,
    error: Option<String>,
    reclaimed: Option<String>,
    container_id: Option<String>,
}

impl LaunchFsm {
    /// Create a new FSM in probing state
    pub fn new() -> Self {
        Self {
            state: LaunchState::Probing,
            error: None,
            reclaimed: None,
            container_id: None,
        }
    }

    /// Get current state
    pub fn state(&self) -> &LaunchState {
        &self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Id of the container that was reclaimed, if any
    pub fn reclaimed(&self) -> Option<&str> {
        self.reclaimed.as_deref()
    }

    /// Id of the container started by this launch
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: LaunchEvent) -> Result<(), String> {
        let new_state = match (&self.state, &event) {
            // From Probing
            (LaunchState::Probing, LaunchEvent::NotFound) => LaunchState::Starting,
            (LaunchState::Probing, LaunchEvent::Found(id)) => {
                self.reclaimed = Some(id.clone());
                LaunchState::Reclaiming
            }

            // From Reclaiming
            (LaunchState::Reclaiming, LaunchEvent::Reclaimed) => LaunchState::Starting,

            // From Starting
            (LaunchState::Starting, LaunchEvent::Started(id)) => {
                self.container_id = Some(id.clone());
                LaunchState::Confirming
            }

            // From Confirming
            (LaunchState::Confirming, LaunchEvent::Ready) => LaunchState::Running,
            (LaunchState::Confirming, LaunchEvent::TimedOut) => {
                self.error = Some("timed out waiting for running state".to_string());
                LaunchState::Failed
            }

            // Any runtime failure before a terminal state
            (state, LaunchEvent::Fail(err)) if !state.is_terminal() => {
                self.error = Some(err.clone());
                LaunchState::Failed
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(())
    }
}

impl Default for LaunchFsm {
    fn default() -> Self {
        Self::new()
    }
}
