//! In-memory collaborators for tests

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use mycitool::deploy::docker::{ContainerRuntime, RunSpec};
use mycitool::deploy::git::VcsClient;
use mycitool::errors::{RuntimeError, VcsError};
use mycitool::filesys::dir::Dir;
use mycitool::models::deployment::ContainerStatus;

/// A runtime call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Find(String),
    Stop(String),
    Remove(String),
    Build(String),
    Run(RunSpec),
    Status(String),
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub running: bool,
}

#[derive(Default)]
struct RuntimeState {
    containers: Vec<FakeContainer>,
    calls: Vec<Call>,
    statuses: VecDeque<ContainerStatus>,
    next_id: u32,
    fail_find: Option<RuntimeError>,
    fail_stop: Option<RuntimeError>,
    fail_remove: Option<RuntimeError>,
    fail_build: Option<RuntimeError>,
    fail_run: Option<RuntimeError>,
    fail_status: Option<RuntimeError>,
}

/// Container runtime that keeps containers in memory.
///
/// Status reads pop from a script; once it is empty they return
/// `idle_status`. Like a real runtime, it refuses to create a second
/// container with a taken name and to remove a running container.
pub struct FakeRuntime {
    state: Mutex<RuntimeState>,
    idle_status: ContainerStatus,
}

impl FakeRuntime {
    /// Containers report `idle_status` unless a script says otherwise
    pub fn new(idle_status: ContainerStatus) -> Self {
        Self {
            state: Mutex::new(RuntimeState::default()),
            idle_status,
        }
    }

    /// Containers are running as soon as they are asked
    pub fn running() -> Self {
        Self::new(ContainerStatus::Running)
    }

    pub fn with_statuses(self, statuses: Vec<ContainerStatus>) -> Self {
        self.state.lock().unwrap().statuses = statuses.into();
        self
    }

    pub fn with_container(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().containers.push(FakeContainer {
            id: id.to_string(),
            name: name.to_string(),
            image: name.to_string(),
            running: true,
        });
        self
    }

    pub fn fail_find(self, err: RuntimeError) -> Self {
        self.state.lock().unwrap().fail_find = Some(err);
        self
    }

    pub fn fail_stop(self, err: RuntimeError) -> Self {
        self.state.lock().unwrap().fail_stop = Some(err);
        self
    }

    pub fn fail_remove(self, err: RuntimeError) -> Self {
        self.state.lock().unwrap().fail_remove = Some(err);
        self
    }

    pub fn fail_build(self, err: RuntimeError) -> Self {
        self.state.lock().unwrap().fail_build = Some(err);
        self
    }

    pub fn fail_run(self, err: RuntimeError) -> Self {
        self.state.lock().unwrap().fail_run = Some(err);
        self
    }

    pub fn fail_status(self, err: RuntimeError) -> Self {
        self.state.lock().unwrap().fail_status = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn containers_named(&self, name: &str) -> Vec<FakeContainer> {
        self.state
            .lock()
            .unwrap()
            .containers
            .iter()
            .filter(|c| c.name == name)
            .cloned()
            .collect()
    }

    pub fn built(&self) -> bool {
        self.calls().iter().any(|c| matches!(c, Call::Build(_)))
    }

    pub fn started(&self) -> bool {
        self.calls().iter().any(|c| matches!(c, Call::Run(_)))
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn find_container(&self, name: &str) -> Result<Option<String>, RuntimeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Find(name.to_string()));
        if let Some(err) = state.fail_find.clone() {
            return Err(err);
        }
        Ok(state
            .containers
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id.clone()))
    }

    async fn stop_container(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Stop(id.to_string()));
        if let Some(err) = state.fail_stop.clone() {
            return Err(err);
        }
        match state.containers.iter_mut().find(|c| c.id == id) {
            Some(container) => {
                container.running = false;
                Ok(())
            }
            None => Err(RuntimeError::Api(format!("No such container: {}", id))),
        }
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Remove(id.to_string()));
        if let Some(err) = state.fail_remove.clone() {
            return Err(err);
        }
        let Some(pos) = state.containers.iter().position(|c| c.id == id) else {
            return Err(RuntimeError::Api(format!("No such container: {}", id)));
        };
        if state.containers[pos].running {
            return Err(RuntimeError::Api(format!(
                "cannot remove container {}: container is running",
                id
            )));
        }
        state.containers.remove(pos);
        Ok(())
    }

    async fn build_image(&self, _context: &Path, tag: &str) -> Result<String, RuntimeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Build(tag.to_string()));
        if let Some(err) = state.fail_build.clone() {
            return Err(err);
        }
        Ok("sha256:4e5f6a7b8c9d0e1f2a3b4c5d".to_string())
    }

    async fn run_container(&self, spec: &RunSpec) -> Result<String, RuntimeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Run(spec.clone()));
        if let Some(err) = state.fail_run.clone() {
            return Err(err);
        }
        if state.containers.iter().any(|c| c.name == spec.name) {
            return Err(RuntimeError::Api(format!(
                "Conflict. The container name \"/{}\" is already in use",
                spec.name
            )));
        }
        state.next_id += 1;
        let id = format!("{:064x}", state.next_id);
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: spec.name.clone(),
            image: spec.image.clone(),
            running: false,
        });
        Ok(id)
    }

    async fn container_status(&self, id: &str) -> Result<ContainerStatus, RuntimeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Status(id.to_string()));
        if let Some(err) = state.fail_status.clone() {
            return Err(err);
        }
        let status = state
            .statuses
            .pop_front()
            .unwrap_or_else(|| self.idle_status.clone());
        if let Some(container) = state.containers.iter_mut().find(|c| c.id == id) {
            container.running = status.is_running();
        }
        Ok(status)
    }
}

/// Version-control client that writes a fixed set of files
pub struct FakeVcs {
    files: Vec<(String, String)>,
    failure: Option<Box<dyn Fn() -> VcsError + Send + Sync>>,
    clones: Mutex<u32>,
}

impl FakeVcs {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, body)| (name.to_string(), body.to_string()))
                .collect(),
            failure: None,
            clones: Mutex::new(0),
        }
    }

    /// A repository with a Dockerfile and one source file
    pub fn service() -> Self {
        Self::with_files(&[
            ("Dockerfile", "FROM python:3.12-slim\nCOPY app.py .\nCMD [\"python\", \"app.py\"]\n"),
            ("app.py", "print('hello')\n"),
        ])
    }

    pub fn failing(failure: impl Fn() -> VcsError + Send + Sync + 'static) -> Self {
        Self {
            failure: Some(Box::new(failure)),
            ..Self::with_files(&[])
        }
    }

    pub fn clones(&self) -> u32 {
        *self.clones.lock().unwrap()
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn clone_repo(&self, _url: &str, path: &Path, _branch: &str) -> Result<(), VcsError> {
        *self.clones.lock().unwrap() += 1;
        if let Some(failure) = &self.failure {
            return Err(failure());
        }

        let dest = Dir::new(path);
        if dest.exists().await {
            return Err(VcsError::Failed(format!(
                "destination path '{}' already exists",
                path.display()
            )));
        }
        dest.create().await?;
        for (name, body) in &self.files {
            dest.file(name).write_string(body).await?;
        }
        Ok(())
    }
}

/// Sleep function that records requested delays and returns at once
#[derive(Default)]
pub struct RecordingSleep {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleep {
    pub fn sleeper(&self) -> impl Fn(Duration) -> std::future::Ready<()> + '_ {
        move |d| {
            self.sleeps.lock().unwrap().push(d);
            std::future::ready(())
        }
    }

    pub fn count(&self) -> usize {
        self.sleeps.lock().unwrap().len()
    }

    pub fn total(&self) -> Duration {
        self.sleeps.lock().unwrap().iter().sum()
    }
}
