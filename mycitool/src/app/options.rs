//! Application configuration options

use std::time::Duration;

use crate::app::cli::Cli;
use crate::app::settings::Settings;
use crate::deploy::launcher::LaunchOptions;
use crate::errors::DeployError;
use crate::logs::LogOptions;
use crate::models::deployment::{DeploymentRequest, PortMapping};

/// Resolved options for one run
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// What to deploy
    pub request: DeploymentRequest,

    /// Launch controller options
    pub launch: LaunchOptions,

    /// Logging options
    pub log: LogOptions,
}

impl AppOptions {
    /// Combine command line arguments with settings, the command line winning
    pub fn resolve(cli: &Cli, settings: &Settings) -> Result<Self, DeployError> {
        let repo = cli
            .repo
            .clone()
            .ok_or_else(|| DeployError::Config("a repository URL is required".to_string()))?;
        let path = cli
            .path
            .clone()
            .ok_or_else(|| DeployError::Config("a checkout path is required".to_string()))?;

        let timeout = Duration::from_secs(cli.timeout);
        let request =
            DeploymentRequest::new(repo, path, cli.branch.clone(), cli.tag.clone(), timeout);

        let launch = LaunchOptions {
            timeout,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
            ports: PortMapping {
                container_port: settings.container_port,
                host_port: settings.host_port,
            },
        };

        Ok(Self {
            request,
            launch,
            log: log_options(cli, settings),
        })
    }
}

/// Logging options from the command line and settings
pub fn log_options(cli: &Cli, settings: &Settings) -> LogOptions {
    LogOptions {
        log_level: cli.log_level.unwrap_or(settings.log_level),
        stdout: settings.log_stdout,
        log_dir: settings.log_dir.clone(),
        json_format: cli.json_logs || settings.json_logs,
    }
}
