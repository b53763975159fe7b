// Registry of open script environments keyed by script identity.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::environment::ScriptEnvironment;
use crate::bridge::EventBridge;
use crate::config::DEFAULT_OBSERVER_CHANNEL_CAPACITY;
use crate::script::ScriptDocument;

/// At most one environment exists per script identity. Environments are
/// attached to the bridge on creation and disposed before removal.
#[derive(Debug)]
pub struct ScriptEnvironmentRegistry {
    environments: RwLock<HashMap<Uuid, Arc<ScriptEnvironment>>>,
    bridge: Arc<EventBridge>,
    observer_capacity: usize,
}

impl ScriptEnvironmentRegistry {
    pub fn new(bridge: Arc<EventBridge>) -> Self {
        Self::with_observer_capacity(bridge, DEFAULT_OBSERVER_CHANNEL_CAPACITY)
    }

    pub fn with_observer_capacity(bridge: Arc<EventBridge>, observer_capacity: usize) -> Self {
        Self { environments: RwLock::new(HashMap::new()), bridge, observer_capacity }
    }

    pub fn bridge(&self) -> &Arc<EventBridge> {
        &self.bridge
    }

    /// Return the environment for the document's identity, creating and
    /// attaching one if none is open. When one already exists the given
    /// document is discarded.
    pub async fn get_or_create(&self, document: ScriptDocument) -> Arc<ScriptEnvironment> {
        let id = document.id();
        if let Some(existing) = self.environments.read().await.get(&id) {
            return Arc::clone(existing);
        }

        let mut environments = self.environments.write().await;
        if let Some(existing) = environments.get(&id) {
            return Arc::clone(existing);
        }

        let environment = Arc::new(ScriptEnvironment::new(document, self.observer_capacity));
        self.bridge.attach(&environment);
        environments.insert(id, Arc::clone(&environment));
        info!(script_id = %id, open = environments.len(), "script environment opened");
        environment
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<ScriptEnvironment>> {
        self.environments.read().await.get(&id).cloned()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.environments.read().await.contains_key(&id)
    }

    /// Dispose and forget the environment. Returns whether one was open.
    pub async fn remove(&self, id: Uuid) -> bool {
        let mut environments = self.environments.write().await;
        let Some(environment) = environments.get(&id).cloned() else {
            return false;
        };

        environment.dispose().await;
        environments.remove(&id);
        drop(environments);

        self.bridge.forget_script(id);
        info!(script_id = %id, "script environment closed");
        true
    }

    pub async fn ids(&self) -> Vec<Uuid> {
        self.environments.read().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.environments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.environments.read().await.is_empty()
    }

    /// Dispose every open environment.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<_> = self.environments.write().await.drain().collect();
        for (id, environment) in &drained {
            environment.dispose().await;
            self.bridge.forget_script(*id);
        }
        debug!(closed = drained.len(), "all script environments closed");
        drained.len()
    }
}
