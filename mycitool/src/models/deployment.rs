//! Deployment models

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a container short id
const CONTAINER_SHORT_ID_LEN: usize = 12;

/// Hex characters kept in an image short id
const IMAGE_SHORT_ID_LEN: usize = 10;

/// A single deployment run, built once from invocation parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    source_url: String,
    checkout_path: PathBuf,
    revision: String,
    image_identity: String,
    timeout: Duration,
}

impl DeploymentRequest {
    pub fn new(
        source_url: impl Into<String>,
        checkout_path: impl Into<PathBuf>,
        revision: impl Into<String>,
        image_identity: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            source_url: source_url.into(),
            checkout_path: checkout_path.into(),
            revision: revision.into(),
            image_identity: image_identity.into(),
            timeout,
        }
    }

    /// Source repository URL
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Local checkout destination
    pub fn checkout_path(&self) -> &Path {
        &self.checkout_path
    }

    /// Branch or revision to check out
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Image tag and container name
    pub fn image_identity(&self) -> &str {
        &self.image_identity
    }

    /// Maximum wait for the container to reach the running state
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// A checked-out revision on disk
#[derive(Debug, PartialEq, Eq)]
pub struct WorkingCopy {
    path: PathBuf,
    revision: String,
}

impl WorkingCopy {
    pub fn new(path: impl Into<PathBuf>, revision: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            revision: revision.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }
}

/// A built image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Full image id as reported by the build engine
    pub id: String,

    /// Tag the image was built with
    pub tag: String,
}

impl Image {
    /// Short form of the image id, `sha256:` followed by 10 hex characters
    pub fn short_id(&self) -> String {
        match self.id.strip_prefix("sha256:") {
            Some(hex) => format!("sha256:{}", truncate(hex, IMAGE_SHORT_ID_LEN)),
            None => truncate(&self.id, IMAGE_SHORT_ID_LEN).to_string(),
        }
    }
}

/// A container observed in the running state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInstance {
    /// Full container id
    pub id: String,

    /// Container name (the image identity)
    pub name: String,

    /// Image the container was started from
    pub image: String,

    /// When the running state was observed
    pub running_since: DateTime<Utc>,
}

impl ContainerInstance {
    pub fn short_id(&self) -> &str {
        short_container_id(&self.id)
    }
}

/// Short form of a container id
pub fn short_container_id(id: &str) -> &str {
    truncate(id, CONTAINER_SHORT_ID_LEN)
}

fn truncate(s: &str, len: usize) -> &str {
    match s.char_indices().nth(len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Container status as reported by the runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Restarting,
    Running,
    Removing,
    Paused,
    Exited,
    Dead,
    Unknown(String),
}

impl ContainerStatus {
    /// Parse the runtime's status string
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "created" => ContainerStatus::Created,
            "restarting" => ContainerStatus::Restarting,
            "running" => ContainerStatus::Running,
            "removing" => ContainerStatus::Removing,
            "paused" => ContainerStatus::Paused,
            "exited" => ContainerStatus::Exited,
            "dead" => ContainerStatus::Dead,
            other => ContainerStatus::Unknown(other.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        *self == ContainerStatus::Running
    }

    /// The container's main process has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContainerStatus::Exited | ContainerStatus::Dead)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Running => "running",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
            ContainerStatus::Unknown(raw) => raw,
        };
        f.write_str(s)
    }
}

/// Container-to-host port publication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
}

impl Default for PortMapping {
    fn default() -> Self {
        Self {
            container_port: 8080,
            host_port: 8080,
        }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host_port, self.container_port)
    }
}
