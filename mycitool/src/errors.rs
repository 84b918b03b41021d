//! Error types for mycitool

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::models::deployment::ContainerStatus;

/// Failures reported by the version-control client
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("version control client unavailable: {0}")]
    Unavailable(String),

    #[error("remote unreachable: {0}")]
    RemoteUnreachable(String),

    #[error("unknown revision '{revision}': {message}")]
    UnknownRevision { revision: String, message: String },

    #[error("clone failed: {0}")]
    Failed(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by the container runtime client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The runtime could not be reached at all (binary missing, daemon down)
    #[error("container runtime unavailable: {0}")]
    Unavailable(String),

    /// The runtime answered but rejected the request
    #[error("container runtime API error: {0}")]
    Api(String),

    #[error("image build failed: {0}")]
    BuildFailed(String),

    #[error("invalid request: {0}")]
    InvalidInput(String),
}

/// Main error type for a deployment run
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Fetch error: failed to check out {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: VcsError,
    },

    #[error("Missing build descriptor: {descriptor} not found in {}", path.display())]
    MissingBuildDescriptor { path: PathBuf, descriptor: String },

    #[error("Build execution error: failed to build image {tag}: {message}")]
    BuildExecution { tag: String, message: String },

    #[error("Invalid build input: {0}")]
    InvalidBuildInput(String),

    #[error("Build engine unavailable: {0}")]
    BuildEngineUnavailable(String),

    #[error("Reclaim error: failed to clear container {container}: {source}")]
    Reclaim {
        container: String,
        #[source]
        source: RuntimeError,
    },

    #[error("Start error: failed to run container from {image}: {source}")]
    Start {
        image: String,
        #[source]
        source: RuntimeError,
    },

    #[error("Container {short_id} not running after {waited:?} (last status: {last_status})")]
    StartupTimeout {
        short_id: String,
        waited: Duration,
        last_status: ContainerStatus,
    },

    #[error("Status query error: failed to read status of container {short_id}: {source}")]
    StatusQuery {
        short_id: String,
        #[source]
        source: RuntimeError,
    },

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeployError {
    /// The workflow stage the error was raised in
    pub fn stage(&self) -> &'static str {
        match self {
            DeployError::Fetch { .. } => "fetch",
            DeployError::MissingBuildDescriptor { .. }
            | DeployError::BuildExecution { .. }
            | DeployError::InvalidBuildInput(_)
            | DeployError::BuildEngineUnavailable(_) => "build",
            DeployError::Reclaim { .. }
            | DeployError::Start { .. }
            | DeployError::StartupTimeout { .. }
            | DeployError::StatusQuery { .. }
            | DeployError::InvalidTransition(_) => "launch",
            DeployError::Config(_) | DeployError::Io(_) | DeployError::Json(_) => "setup",
        }
    }
}
