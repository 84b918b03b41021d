//! Container launch controller
//!
//! Drives a single launch through lookup, reclaim, start and confirm:
//!
//! 1. look up a container already named after the image identity,
//! 2. stop and remove it if present,
//! 3. start a detached container from the image under that name,
//! 4. poll its status until `running` or until the timeout is used up.
//!
//! On success exactly one container with the identity exists and was seen
//! running. A container that never reaches `running` is left in place.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::deploy::docker::{ContainerRuntime, RunSpec};
use crate::deploy::fsm::{LaunchEvent, LaunchFsm};
use crate::errors::{DeployError, RuntimeError};
use crate::models::deployment::{
    short_container_id, ContainerInstance, ContainerStatus, PortMapping,
};
use crate::utils::{poll_until, PollOptions};

/// Launch options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Maximum wait for the running state
    pub timeout: Duration,

    /// Delay between status checks
    pub poll_interval: Duration,

    /// Published port
    pub ports: PortMapping,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
            ports: PortMapping::default(),
        }
    }
}

/// Launch `image_identity` and wait for it to run, sleeping with tokio
pub async fn launch(
    runtime: &dyn ContainerRuntime,
    image_identity: &str,
    options: &LaunchOptions,
) -> Result<ContainerInstance, DeployError> {
    launch_with_sleep(runtime, image_identity, options, tokio::time::sleep).await
}

/// Launch `image_identity` using `sleep_fn` between status checks
pub async fn launch_with_sleep<S, F>(
    runtime: &dyn ContainerRuntime,
    image_identity: &str,
    options: &LaunchOptions,
    sleep_fn: S,
) -> Result<ContainerInstance, DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let mut fsm = LaunchFsm::new();

    let result = drive(&mut fsm, runtime, image_identity, options, sleep_fn).await;
    if let Err(e) = &result {
        // Timeouts already moved the FSM to Failed
        if !fsm.state().is_terminal() {
            debug!("Launch failed while {:?}", fsm.state());
            advance(&mut fsm, LaunchEvent::Fail(e.to_string()))?;
        }
    }
    result
}

async fn drive<S, F>(
    fsm: &mut LaunchFsm,
    runtime: &dyn ContainerRuntime,
    image_identity: &str,
    options: &LaunchOptions,
    sleep_fn: S,
) -> Result<ContainerInstance, DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    // Look up
    info!("Checking if container {} already exists", image_identity);
    let existing = runtime
        .find_container(image_identity)
        .await
        .map_err(|e| reclaim_error(image_identity, e))?;

    match existing {
        None => {
            info!("No existing container named {}", image_identity);
            advance(fsm, LaunchEvent::NotFound)?;
        }
        Some(id) => {
            info!(
                "Container {} already exists ({}), stopping and removing it first",
                image_identity,
                short_container_id(&id)
            );
            advance(fsm, LaunchEvent::Found(id.clone()))?;
            reclaim(runtime, image_identity, &id).await?;
            advance(fsm, LaunchEvent::Reclaimed)?;
        }
    }

    // Start
    info!("Running image {}", image_identity);
    let spec = RunSpec {
        image: image_identity.to_string(),
        name: image_identity.to_string(),
        ports: options.ports,
        detached: true,
    };
    let container_id = runtime.run_container(&spec).await.map_err(|e| {
        error!("Container runtime failed to run {}: {}", image_identity, e);
        DeployError::Start {
            image: image_identity.to_string(),
            source: e,
        }
    })?;
    let short_id = short_container_id(&container_id).to_string();
    info!("Container created: {}", short_id);
    advance(fsm, LaunchEvent::Started(container_id.clone()))?;

    // Confirm
    info!("Waiting up to {:?} for container {} to run", options.timeout, short_id);
    let poll = PollOptions {
        interval: options.poll_interval,
        timeout: options.timeout,
    };
    let (id, sid) = (container_id.as_str(), short_id.as_str());
    let polled = poll_until(
        &poll,
        sleep_fn,
        move || async move {
            let status = runtime.container_status(id).await?;
            debug!("Container {} status: {}", sid, status);
            if status.is_terminal() {
                warn!("Container {} is {}, still waiting", sid, status);
            }
            Ok::<_, RuntimeError>(status)
        },
        ContainerStatus::is_running,
    )
    .await
    .map_err(|e| {
        error!("Failed to read status of container {}: {}", short_id, e);
        DeployError::StatusQuery {
            short_id: short_id.clone(),
            source: e,
        }
    })?;

    if !polled.satisfied {
        error!("Container failed to start: {}", short_id);
        advance(fsm, LaunchEvent::TimedOut)?;
        return Err(DeployError::StartupTimeout {
            short_id,
            waited: polled.elapsed,
            last_status: polled.last,
        });
    }

    advance(fsm, LaunchEvent::Ready)?;
    info!("Container running: {} (after {:?})", short_id, polled.elapsed);
    Ok(ContainerInstance {
        id: container_id,
        name: image_identity.to_string(),
        image: image_identity.to_string(),
        running_since: Utc::now(),
    })
}

/// Stop then remove the container occupying the identity
async fn reclaim(
    runtime: &dyn ContainerRuntime,
    image_identity: &str,
    id: &str,
) -> Result<(), DeployError> {
    runtime
        .stop_container(id)
        .await
        .map_err(|e| reclaim_error(image_identity, e))?;
    runtime
        .remove_container(id)
        .await
        .map_err(|e| reclaim_error(image_identity, e))?;
    debug!("Reclaimed container {}", short_container_id(id));
    Ok(())
}

fn reclaim_error(image_identity: &str, source: RuntimeError) -> DeployError {
    error!(
        "Container runtime failed while clearing container {}: {}",
        image_identity, source
    );
    DeployError::Reclaim {
        container: image_identity.to_string(),
        source,
    }
}

fn advance(fsm: &mut LaunchFsm, event: LaunchEvent) -> Result<(), DeployError> {
    fsm.process(event).map_err(DeployError::InvalidTransition)?;
    debug!("Launch state: {:?}", fsm.state());
    Ok(())
}
