//! mycitool - Entry Point
//!
//! One-shot deployment: clone a repository, build its Dockerfile and run the
//! resulting image until the container reports `running`.

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use mycitool::app::cli::Cli;
use mycitool::app::options::{log_options, AppOptions};
use mycitool::app::run::run;
use mycitool::app::settings::Settings;
use mycitool::deploy::docker::DockerCli;
use mycitool::deploy::git::GitCli;
use mycitool::diagnostic;
use mycitool::logs::init_logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Retrieve the settings file
    let settings = match Settings::load(cli.config.as_deref()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to read settings file: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging
    let _log_guard = match init_logging(log_options(&cli, &settings)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    let vcs = GitCli::new(settings.git_binary.as_str());
    let runtime = DockerCli::new(settings.docker_binary.as_str());

    // Run diagnostics
    if cli.diagnostic {
        let report = diagnostic::collect(&vcs, &runtime).await;
        if let Err(e) = diagnostic::print(&report) {
            error!("Failed to print diagnostic report: {e}");
            return ExitCode::FAILURE;
        }
        return if report.all_available() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    let options = match AppOptions::resolve(&cli, &settings) {
        Ok(options) => options,
        Err(e) => {
            error!("Invalid arguments: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("Running mycitool with options: {:?}", options);
    match run(&options.request, &options.launch, &vcs, &runtime).await {
        Ok(instance) => {
            info!("Container {} is running as {}", instance.short_id(), instance.name);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Deployment failed during {} stage: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}
