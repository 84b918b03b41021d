//! Image builder

use tracing::{error, info};

use crate::deploy::docker::ContainerRuntime;
use crate::errors::{DeployError, RuntimeError};
use crate::filesys::dir::Dir;
use crate::models::deployment::{Image, WorkingCopy};

/// Build descriptor expected at the root of a working copy
pub const BUILD_DESCRIPTOR: &str = "Dockerfile";

/// Build an image tagged `image_identity` from `working_copy`.
///
/// Fails without touching the build engine when the descriptor is missing or
/// the identity is blank.
pub async fn build(
    runtime: &dyn ContainerRuntime,
    working_copy: WorkingCopy,
    image_identity: &str,
) -> Result<Image, DeployError> {
    let root = Dir::new(working_copy.path());
    if !root.file(BUILD_DESCRIPTOR).is_file().await {
        error!("{} not found in {}", BUILD_DESCRIPTOR, working_copy.path().display());
        return Err(DeployError::MissingBuildDescriptor {
            path: working_copy.path().to_path_buf(),
            descriptor: BUILD_DESCRIPTOR.to_string(),
        });
    }

    if image_identity.trim().is_empty() {
        error!("An image identity is required to tag the build");
        return Err(DeployError::InvalidBuildInput(
            "image identity must not be empty".to_string(),
        ));
    }

    info!("Building image {} from {}", image_identity, working_copy.path().display());
    let id = runtime
        .build_image(working_copy.path(), image_identity)
        .await
        .map_err(|e| {
            let err = classify(image_identity, e);
            error!("Image build failed: {}", err);
            err
        })?;

    let image = Image {
        id,
        tag: image_identity.to_string(),
    };
    info!("Image built: {}", image.short_id());
    Ok(image)
}

fn classify(image_identity: &str, err: RuntimeError) -> DeployError {
    match err {
        RuntimeError::BuildFailed(message) => DeployError::BuildExecution {
            tag: image_identity.to_string(),
            message,
        },
        RuntimeError::InvalidInput(message) => DeployError::InvalidBuildInput(message),
        RuntimeError::Api(message) | RuntimeError::Unavailable(message) => {
            DeployError::BuildEngineUnavailable(message)
        }
    }
}
