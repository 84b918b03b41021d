//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

use crate::logs::LogLevel;

/// Check out a repository, build its Dockerfile and run the image
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "mycitool", version, about)]
pub struct Cli {
    /// The URL for the Git repository to clone
    #[arg(required_unless_present = "diagnostic")]
    pub repo: Option<String>,

    /// The local path to clone the Git repository into
    #[arg(required_unless_present = "diagnostic")]
    pub path: Option<PathBuf>,

    /// Branch to check out
    #[arg(short, long, default_value = "main")]
    pub branch: String,

    /// Seconds to wait for the container to reach the running state
    #[arg(short, long, default_value_t = 120)]
    pub timeout: u64,

    /// Tag applied to the image, also used as the container name
    #[arg(long, default_value = "outbrain-cherrypy")]
    pub tag: String,

    /// JSON settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level, overriding the settings file
    #[arg(long, value_enum, ignore_case = true)]
    pub log_level: Option<LogLevel>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,

    /// Print version and collaborator availability, then exit
    #[arg(long)]
    pub diagnostic: bool,
}
