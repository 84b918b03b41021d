//! Settings file management

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Tool settings, read from an optional JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Log to stdout. May only be turned off when `log_dir` is set.
    #[serde(default = "default_log_stdout")]
    pub log_stdout: bool,

    /// Also write logs to `mycitool.log` in this directory
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Version-control client binary
    #[serde(default = "default_git_binary")]
    pub git_binary: String,

    /// Container runtime binary
    #[serde(default = "default_docker_binary")]
    pub docker_binary: String,

    /// Seconds between two status checks while waiting for the container
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Port the service listens on inside the container
    #[serde(default = "default_port")]
    pub container_port: u16,

    /// Port published on the host
    #[serde(default = "default_port")]
    pub host_port: u16,
}

fn default_log_stdout() -> bool {
    true
}

fn default_git_binary() -> String {
    "git".to_string()
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

fn default_poll_interval() -> u64 {
    1
}

fn default_port() -> u16 {
    8080
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_stdout: default_log_stdout(),
            log_dir: None,
            git_binary: default_git_binary(),
            docker_binary: default_docker_binary(),
            poll_interval_secs: default_poll_interval(),
            container_port: default_port(),
            host_port: default_port(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or the defaults when no path is given
    pub async fn load(path: Option<&Path>) -> Result<Self, DeployError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let file = File::new(path);
        if !file.is_file().await {
            return Err(DeployError::Config(format!(
                "settings file not found: {}",
                path.display()
            )));
        }

        let settings: Settings = file.read_json().await?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DeployError> {
        if self.poll_interval_secs == 0 {
            return Err(DeployError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        if !self.log_stdout && self.log_dir.is_none() {
            return Err(DeployError::Config(
                "log_stdout can only be disabled when log_dir is set".to_string(),
            ));
        }
        if self.git_binary.trim().is_empty() || self.docker_binary.trim().is_empty() {
            return Err(DeployError::Config(
                "git_binary and docker_binary must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
