//! Repository fetcher

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::errors::{DeployError, VcsError};
use crate::filesys::dir::Dir;
use crate::models::deployment::WorkingCopy;

/// Version-control client used to obtain working copies
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Full clone of `url` at `branch` into `path`. `path` must not exist.
    async fn clone_repo(&self, url: &str, path: &Path, branch: &str) -> Result<(), VcsError>;
}

/// Check out `revision` of `url` into `dest`, destroying whatever was there.
pub async fn fetch(
    vcs: &dyn VcsClient,
    url: &str,
    dest: &Path,
    revision: &str,
) -> Result<WorkingCopy, DeployError> {
    let fetch_error = |source: VcsError| {
        error!("Failed to check out {} into {}: {}", url, dest.display(), source);
        DeployError::Fetch {
            url: url.to_string(),
            source,
        }
    };

    let target = Dir::new(dest);
    if target
        .clear()
        .await
        .map_err(|e| fetch_error(VcsError::Io(e)))?
    {
        debug!("Removed existing checkout at {}", dest.display());
    }

    debug!("Cloning {} (branch: {}) into {}...", url, revision, dest.display());
    vcs.clone_repo(url, dest, revision)
        .await
        .map_err(fetch_error)?;

    info!("Repository {} checked out to {}", url, dest.display());
    Ok(WorkingCopy::new(dest, revision))
}

/// `git` command-line client
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: String,
}

impl GitCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// `git --version`, used by diagnostics
    pub async fn version(&self) -> Result<String, VcsError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| VcsError::Unavailable(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(VcsError::Unavailable(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait]
impl VcsClient for GitCli {
    async fn clone_repo(&self, url: &str, path: &Path, branch: &str) -> Result<(), VcsError> {
        let output = Command::new(&self.binary)
            .args(["clone", "--branch", branch, "--", url])
            .arg(path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| VcsError::Unavailable(format!("failed to run {}: {}", self.binary, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_clone_failure(branch, stderr))
    }
}

/// Map git's stderr on a failed clone to a failure kind
pub fn classify_clone_failure(branch: &str, stderr: String) -> VcsError {
    const UNKNOWN_REVISION: &[&str] = &["not found in upstream", "couldn't find remote ref"];
    const UNREACHABLE: &[&str] = &[
        "could not resolve host",
        "unable to access",
        "does not appear to be a git repository",
        "repository not found",
        "connection refused",
        "could not read from remote repository",
        "terminal prompts disabled",
    ];

    let lower = stderr.to_lowercase();
    let is_unknown_revision = (lower.contains("remote branch") && lower.contains("not found"))
        || UNKNOWN_REVISION.iter().any(|m| lower.contains(m));
    let is_missing_repository =
        lower.contains("repository '") && lower.contains("' does not exist");

    if is_unknown_revision {
        VcsError::UnknownRevision {
            revision: branch.to_string(),
            message: stderr,
        }
    } else if is_missing_repository || UNREACHABLE.iter().any(|m| lower.contains(m)) {
        VcsError::RemoteUnreachable(stderr)
    } else {
        VcsError::Failed(stderr)
    }
}
