//! Environment diagnostics

use colored::Colorize;
use serde::Serialize;

use crate::deploy::docker::DockerCli;
use crate::deploy::git::GitCli;
use crate::utils::{version_info, VersionInfo};

/// Availability of one collaborator
#[derive(Debug, Clone, Serialize)]
pub struct ToolCheck {
    pub name: String,
    pub available: bool,
    pub detail: String,
}

impl ToolCheck {
    fn from_result<E: std::fmt::Display>(name: &str, result: Result<String, E>) -> Self {
        match result {
            Ok(version) => Self {
                name: name.to_string(),
                available: true,
                detail: version,
            },
            Err(e) => Self {
                name: name.to_string(),
                available: false,
                detail: e.to_string(),
            },
        }
    }

    /// One human-readable line
    pub fn render(&self) -> String {
        let mark = if self.available {
            "ok".green().bold()
        } else {
            "unavailable".red().bold()
        };
        format!("{:<8} {} {}", self.name, mark, self.detail)
    }
}

/// Diagnostic report
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub version: VersionInfo,
    pub tools: Vec<ToolCheck>,
}

impl Diagnostic {
    pub fn all_available(&self) -> bool {
        self.tools.iter().all(|t| t.available)
    }
}

/// Check that git and the container runtime respond
pub async fn collect(git: &GitCli, docker: &DockerCli) -> Diagnostic {
    let tools = vec![
        ToolCheck::from_result("git", git.version().await),
        ToolCheck::from_result("docker", docker.version().await),
    ];
    Diagnostic {
        version: version_info(),
        tools,
    }
}

/// Print the report to stdout
pub fn print(report: &Diagnostic) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(&report.version)?);
    for tool in &report.tools {
        println!("{}", tool.render());
    }
    Ok(())
}
