// Event bridge: turns the execution service's event stream into per-script
// deliveries.
//
// Incoming events are published on the bus keyed by script identity. Each
// attached environment gets one pump task that drains its subscription
// queue in order, so events for one script are applied sequentially while
// scripts never block each other.

use std::sync::{Arc, Weak};

use scriptpad_common::protocol::events::ServiceEvent;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::bus::EventBus;
use crate::engine::{Delivery, FileStateCache, ScriptEnvironment, TrackedFile};

#[derive(Debug, Default)]
pub struct EventBridge {
    bus: EventBus,
    files: Arc<FileStateCache>,
}

impl EventBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn files(&self) -> &Arc<FileStateCache> {
        &self.files
    }

    pub fn tracked_file(&self, script_id: Uuid, file_name: &str) -> Option<TrackedFile> {
        self.files.get(script_id, file_name)
    }

    pub fn tracked_file_names(&self, script_id: Uuid) -> Vec<String> {
        self.files.file_names(script_id)
    }

    /// Route one event to the environment it names. Returns how many
    /// subscribers it reached.
    pub fn publish(&self, event: ServiceEvent) -> usize {
        self.bus.publish(event)
    }

    /// Subscribe `environment` to its script's events and start its pump.
    /// The subscription and pump are owned by the environment and released
    /// by `ScriptEnvironment::dispose`.
    pub fn attach(&self, environment: &Arc<ScriptEnvironment>) {
        let (subscription, rx) = self.bus.subscribe(environment.id());
        let pump = tokio::spawn(pump_events(
            Arc::downgrade(environment),
            Arc::clone(&self.files),
            rx,
        ));
        environment.install_subscription(subscription, pump);
        debug!(script_id = %environment.id(), "script environment attached to event bridge");
    }

    /// Drop tracked file state of a closed script.
    pub fn forget_script(&self, script_id: Uuid) {
        let forgotten = self.files.forget_script(script_id);
        if forgotten > 0 {
            debug!(script_id = %script_id, forgotten, "tracked files released");
        }
    }

    /// Publish every event from `stream` until it closes or `shutdown` fires.
    pub async fn run(
        &self,
        mut stream: mpsc::Receiver<ServiceEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        info!("event bridge started");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("event bridge shutting down");
                    break;
                }

                maybe_event = stream.recv() => {
                    match maybe_event {
                        Some(event) => {
                            trace!(script_id = %event.script_id(), kind = event.kind(), "service event received");
                            self.publish(event);
                        }
                        None => {
                            info!("service event stream closed, bridge exiting");
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn pump_events(
    environment: Weak<ScriptEnvironment>,
    files: Arc<FileStateCache>,
    mut rx: mpsc::UnboundedReceiver<ServiceEvent>,
) {
    while let Some(event) = rx.recv().await {
        let Some(environment) = environment.upgrade() else {
            break;
        };

        match environment.deliver(&event, &files).await {
            Ok(Delivery::Applied) => {}
            Ok(Delivery::Dropped) => {
                trace!(script_id = %environment.id(), kind = event.kind(), "event dropped by environment");
            }
            Err(error) => {
                warn!(script_id = %environment.id(), kind = event.kind(), error = %error, "failed to apply service event");
            }
        }
    }
    trace!("script event pump exiting");
}
