//! Deployment run: fetch, build, launch

use std::future::Future;
use std::time::Duration;

use tracing::info;

use crate::deploy::builder::build;
use crate::deploy::docker::ContainerRuntime;
use crate::deploy::git::{fetch, VcsClient};
use crate::deploy::launcher::{launch_with_sleep, LaunchOptions};
use crate::errors::DeployError;
use crate::models::deployment::{ContainerInstance, DeploymentRequest};

/// Run the three stages in order, sleeping with tokio while waiting
pub async fn run(
    request: &DeploymentRequest,
    launch_options: &LaunchOptions,
    vcs: &dyn VcsClient,
    runtime: &dyn ContainerRuntime,
) -> Result<ContainerInstance, DeployError> {
    run_with_sleep(request, launch_options, vcs, runtime, tokio::time::sleep).await
}

/// Run the three stages in order. The first failure aborts the run.
pub async fn run_with_sleep<S, F>(
    request: &DeploymentRequest,
    launch_options: &LaunchOptions,
    vcs: &dyn VcsClient,
    runtime: &dyn ContainerRuntime,
    sleep_fn: S,
) -> Result<ContainerInstance, DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!(
        "Deploying {} (branch: {}) as {}",
        request.source_url(),
        request.revision(),
        request.image_identity()
    );

    let working_copy = fetch(
        vcs,
        request.source_url(),
        request.checkout_path(),
        request.revision(),
    )
    .await?;

    let image = build(runtime, working_copy, request.image_identity()).await?;

    let options = LaunchOptions {
        timeout: request.timeout(),
        ..*launch_options
    };
    let instance = launch_with_sleep(runtime, &image.tag, &options, sleep_fn).await?;

    info!(
        "Deployment complete: container {} running from image {}",
        instance.short_id(),
        image.short_id()
    );
    Ok(instance)
}
