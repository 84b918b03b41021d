//! Container runtime client

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::errors::RuntimeError;
use crate::models::deployment::{ContainerStatus, PortMapping};

/// Parameters for starting a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub image: String,
    pub name: String,
    pub ports: PortMapping,
    pub detached: bool,
}

/// Container runtime operations the deployment relies on.
///
/// Every call is a fresh query of the runtime; nothing is cached.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Id of the container named exactly `name`, if any
    async fn find_container(&self, name: &str) -> Result<Option<String>, RuntimeError>;

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError>;

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Build `context` and tag the result, returning the image id
    async fn build_image(&self, context: &Path, tag: &str) -> Result<String, RuntimeError>;

    /// Create and start a container, returning its id
    async fn run_container(&self, spec: &RunSpec) -> Result<String, RuntimeError>;

    async fn container_status(&self, id: &str) -> Result<ContainerStatus, RuntimeError>;
}

/// `docker` command-line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Server version, used by diagnostics
    pub async fn version(&self) -> Result<String, RuntimeError> {
        self.exec(&["version", "--format", "{{.Server.Version}}"])
            .await
    }

    /// Run docker with `args` and return trimmed stdout
    async fn exec(&self, args: &[&str]) -> Result<String, RuntimeError> {
        debug!("Running {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| {
                RuntimeError::Unavailable(format!("failed to run {}: {}", self.binary, e))
            })?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if is_daemon_unreachable(&stderr) {
            Err(RuntimeError::Unavailable(stderr))
        } else {
            Err(RuntimeError::Api(stderr))
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn find_container(&self, name: &str) -> Result<Option<String>, RuntimeError> {
        let filter = format!("name={}", name);
        let listing = self
            .exec(&[
                "ps",
                "--all",
                "--filter",
                filter.as_str(),
                "--format",
                "{{.ID}}\t{{.Names}}",
            ])
            .await?;
        Ok(find_exact_name(&listing, name))
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.exec(&["stop", id]).await.map(|_| ())
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.exec(&["rm", id]).await.map(|_| ())
    }

    async fn build_image(&self, context: &Path, tag: &str) -> Result<String, RuntimeError> {
        let context = context.to_string_lossy();
        let stdout = self
            .exec(&["build", "--quiet", "--tag", tag, &*context])
            .await
            .map_err(classify_build_failure)?;

        last_line(&stdout)
            .ok_or_else(|| RuntimeError::Api("build produced no image id".to_string()))
    }

    async fn run_container(&self, spec: &RunSpec) -> Result<String, RuntimeError> {
        let args = run_args(spec);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let stdout = self.exec(&args).await?;
        last_line(&stdout)
            .ok_or_else(|| RuntimeError::Api("run produced no container id".to_string()))
    }

    async fn container_status(&self, id: &str) -> Result<ContainerStatus, RuntimeError> {
        let raw = self
            .exec(&["container", "inspect", "--format", "{{.State.Status}}", id])
            .await?;
        Ok(ContainerStatus::parse(&raw))
    }
}

/// `docker run` arguments for `spec`
fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["run".to_string()];
    if spec.detached {
        args.push("--detach".to_string());
    }
    args.extend([
        "--name".to_string(),
        spec.name.clone(),
        "--publish".to_string(),
        spec.ports.to_string(),
        spec.image.clone(),
    ]);
    args
}

fn is_daemon_unreachable(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("cannot connect to the docker daemon")
        || lower.contains("error during connect")
        || lower.contains("is the docker daemon running")
}

/// Split a failed build's API error into invalid input and build failure
fn classify_build_failure(err: RuntimeError) -> RuntimeError {
    const INVALID_INPUT: &[&str] = &[
        "invalid reference format",
        "invalid tag",
        "unable to prepare context",
        "path not found",
    ];

    match err {
        RuntimeError::Api(stderr) => {
            let lower = stderr.to_lowercase();
            if INVALID_INPUT.iter().any(|m| lower.contains(m)) {
                RuntimeError::InvalidInput(stderr)
            } else {
                RuntimeError::BuildFailed(stderr)
            }
        }
        other => other,
    }
}

/// Pick the id whose listed name matches `name` exactly.
///
/// The runtime's name filter matches substrings, so `svc` also lists
/// `svc-old`.
fn find_exact_name(listing: &str, name: &str) -> Option<String> {
    listing.lines().find_map(|line| {
        let (id, names) = line.split_once('\t')?;
        names
            .split(',')
            .any(|n| n.trim().trim_start_matches('/') == name)
            .then(|| id.trim().to_string())
    })
}

fn last_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}
