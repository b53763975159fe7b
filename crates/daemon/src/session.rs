// Script session: the orchestration context that opens, runs, saves and
// closes scripts. It is the only writer of the environment registry.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bridge::EventBridge;
use crate::bus::EventBus;
use crate::config::DaemonConfig;
use crate::engine::{EnvironmentError, ScriptEnvironment, ScriptEnvironmentRegistry};
use crate::script::{DocumentError, ScriptDocument};
use scriptpad_common::types::ScriptStatus;

/// Hands synthesized programs to the external compile-and-execute service.
/// Results come back asynchronously as service events on the bridge.
pub trait ExecutionBackend: Send + Sync {
    fn submit(&self, script_id: Uuid, program: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("script {0} is not open")]
    NotOpen(Uuid),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    #[error("no execution backend configured")]
    NoBackend,

    #[error("execution backend rejected script {script_id}: {message}")]
    Backend { script_id: Uuid, message: String },
}

pub struct ScriptSession {
    config: DaemonConfig,
    registry: ScriptEnvironmentRegistry,
    backend: Option<Arc<dyn ExecutionBackend>>,
}

impl ScriptSession {
    pub fn new(config: DaemonConfig, backend: Option<Arc<dyn ExecutionBackend>>) -> Self {
        let registry = ScriptEnvironmentRegistry::with_observer_capacity(
            Arc::new(EventBridge::new()),
            config.observer_channel_capacity,
        );
        Self { config, registry, backend }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn bridge(&self) -> &Arc<EventBridge> {
        self.registry.bridge()
    }

    pub fn bus(&self) -> &EventBus {
        self.registry.bridge().bus()
    }

    pub fn registry(&self) -> &ScriptEnvironmentRegistry {
        &self.registry
    }

    /// Open a new, unsaved script.
    pub async fn create(&self, name: &str) -> Arc<ScriptEnvironment> {
        let environment = self.registry.get_or_create(ScriptDocument::new(name)).await;
        info!(script_id = %environment.id(), name, "script created");
        environment
    }

    /// Load a script file and open it. A script whose identity is already
    /// open yields the open environment.
    pub async fn open(&self, path: impl AsRef<Path>) -> Result<Arc<ScriptEnvironment>, SessionError> {
        let path = path.as_ref();
        let document = ScriptDocument::load(path).await?;
        let environment = self.registry.get_or_create(document).await;
        info!(script_id = %environment.id(), path = %path.display(), "script opened");
        Ok(environment)
    }

    pub async fn environment(&self, id: Uuid) -> Option<Arc<ScriptEnvironment>> {
        self.registry.get(id).await
    }

    pub async fn close(&self, id: Uuid) -> Result<(), SessionError> {
        if self.registry.remove(id).await {
            Ok(())
        } else {
            Err(SessionError::NotOpen(id))
        }
    }

    /// Close every open script.
    pub async fn close_all(&self) -> usize {
        self.registry.close_all().await
    }

    /// Save the script. New scripts are saved into the configured scripts
    /// directory under their name; an existing file there is never
    /// replaced. Returns the path written.
    pub async fn save(&self, id: Uuid) -> Result<PathBuf, SessionError> {
        let environment = self.require(id).await?;
        let mut document = environment.document().await;
        if document.is_new() {
            let path = document.default_path_in(&self.config.scripts_directory_path);
            document.save_new(path).await?;
        } else {
            document.save().await?;
        }

        let path = document.file_path().map(Path::to_path_buf).unwrap_or_default();
        info!(script_id = %id, path = %path.display(), "script saved");
        Ok(path)
    }

    pub async fn update_code(&self, id: Uuid, code: Option<String>) -> Result<(), SessionError> {
        self.require(id).await?.document().await.update_code(code);
        Ok(())
    }

    pub async fn set_namespaces<I, S>(&self, id: Uuid, namespaces: I) -> Result<(), SessionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.require(id).await?.document().await.set_namespaces(namespaces);
        Ok(())
    }

    /// Synthesize the script's program and submit it. The environment
    /// enters Running before submission, clearing earlier results; a
    /// rejected submission moves it to Error.
    pub async fn run(&self, id: Uuid) -> Result<(), SessionError> {
        let environment = self.require(id).await?;
        let backend = self.backend.as_ref().ok_or(SessionError::NoBackend)?;
        let program = environment.runnable_code().await;

        environment.set_status(ScriptStatus::Running).await?;
        if let Err(error) = backend.submit(id, &program) {
            warn!(script_id = %id, error = %error, "script submission failed");
            environment.set_status(ScriptStatus::Error).await?;
            return Err(SessionError::Backend { script_id: id, message: format!("{error:#}") });
        }

        info!(script_id = %id, bytes = program.len(), "script submitted for execution");
        Ok(())
    }

    async fn require(&self, id: Uuid) -> Result<Arc<ScriptEnvironment>, SessionError> {
        self.registry.get(id).await.ok_or(SessionError::NotOpen(id))
    }
}

impl std::fmt::Debug for ScriptSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptSession")
            .field("config", &self.config)
            .field("has_backend", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}
