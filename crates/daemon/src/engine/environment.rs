// One open script: its document, execution status and accumulated results.
//
// Status machine:
//   any → Running                  (start, or a repeated progress signal)
//   Running → Completed | Error    (completion signal)
//
// Results are cleared only when entering Running from a non-Running state,
// so repeated Running signals keep output that already arrived.

use std::path::Path;
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Utc};
use scriptpad_common::protocol::events::ServiceEvent;
use scriptpad_common::protocol::file_operation::FileOperationResponse;
use scriptpad_common::protocol::text_edit::TextEditError;
use scriptpad_common::types::ScriptStatus;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use uuid::Uuid;

use super::files::FileStateCache;
use crate::bus::Subscription;
use crate::script::ScriptDocument;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: ScriptStatus, to: ScriptStatus },

    #[error("script environment {0} is disposed")]
    Disposed(Uuid),

    #[error(transparent)]
    TextEdit(#[from] TextEditError),
}

/// Notifications for observers of an environment (result panes, loggers).
#[derive(Debug, Clone, PartialEq)]
pub enum EnvironmentEvent {
    StatusChanged { from: ScriptStatus, to: ScriptStatus, at: DateTime<Utc> },
    ResultsCleared,
    OutputAppended { output: String },
    DiagnosticsUpdated { diagnostics: serde_json::Value },
    FileOperationApplied { response: FileOperationResponse },
    DocumentRenamed { name: String },
}

/// Outcome of handing an event to an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// Addressed to another script, or the environment was disposed.
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: ScriptStatus,
    pub to: ScriptStatus,
    pub results_cleared: bool,
}

#[derive(Debug, Default)]
struct EnvironmentState {
    status: ScriptStatus,
    output: Vec<String>,
    latest_diagnostics: Option<serde_json::Value>,
    disposed: bool,
}

pub struct ScriptEnvironment {
    id: Uuid,
    document: Mutex<ScriptDocument>,
    state: Mutex<EnvironmentState>,
    observers: broadcast::Sender<EnvironmentEvent>,
    subscription: StdMutex<Option<Subscription>>,
    pump: StdMutex<Option<JoinHandle<()>>>,
}

impl ScriptEnvironment {
    pub fn new(document: ScriptDocument, observer_capacity: usize) -> Self {
        let (observers, _) = broadcast::channel(observer_capacity.max(1));
        Self {
            id: document.id(),
            document: Mutex::new(document),
            state: Mutex::new(EnvironmentState::default()),
            observers,
            subscription: StdMutex::new(None),
            pump: StdMutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Receive notifications emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EnvironmentEvent> {
        self.observers.subscribe()
    }

    /// Exclusive access to the document, e.g. for edits or saving.
    pub async fn document(&self) -> MutexGuard<'_, ScriptDocument> {
        self.document.lock().await
    }

    pub async fn runnable_code(&self) -> String {
        self.document.lock().await.runnable_code()
    }

    pub async fn status(&self) -> ScriptStatus {
        self.state.lock().await.status
    }

    pub async fn output(&self) -> Vec<String> {
        self.state.lock().await.output.clone()
    }

    pub async fn latest_diagnostics(&self) -> Option<serde_json::Value> {
        self.state.lock().await.latest_diagnostics.clone()
    }

    pub async fn is_disposed(&self) -> bool {
        self.state.lock().await.disposed
    }

    /// Drive the status machine directly, e.g. when a run is submitted.
    pub async fn set_status(&self, to: ScriptStatus) -> Result<StatusTransition, EnvironmentError> {
        let mut state = self.state.lock().await;
        if state.disposed {
            return Err(EnvironmentError::Disposed(self.id));
        }
        self.apply_status(&mut state, to)
    }

    /// Apply one routed event. Events addressed to another script, or
    /// arriving after `dispose`, are dropped without effect.
    pub async fn deliver(
        &self,
        event: &ServiceEvent,
        files: &FileStateCache,
    ) -> Result<Delivery, EnvironmentError> {
        if event.script_id() != self.id {
            return Ok(Delivery::Dropped);
        }

        // Lock order is document, then state; `dispose` never waits on the
        // document.
        let mut document = match event {
            ServiceEvent::FileOperation { response: FileOperationResponse::Renamed { .. }, .. } => {
                Some(self.document.lock().await)
            }
            _ => None,
        };
        let mut state = self.state.lock().await;
        if state.disposed {
            return Ok(Delivery::Dropped);
        }
        trace!(script_id = %self.id, kind = event.kind(), "applying event");

        match event {
            ServiceEvent::ScriptOutputEmitted { output, .. } => {
                if let Some(chunk) = output.as_deref().filter(|chunk| !chunk.is_empty()) {
                    state.output.push(chunk.to_string());
                    self.emit(EnvironmentEvent::OutputAppended { output: chunk.to_string() });
                }
            }
            ServiceEvent::Diagnostics { diagnostics, .. } => {
                state.latest_diagnostics = Some(diagnostics.clone());
                self.emit(EnvironmentEvent::DiagnosticsUpdated { diagnostics: diagnostics.clone() });
            }
            ServiceEvent::ScriptStatusChanged { status, .. } => {
                self.apply_status(&mut state, *status)?;
            }
            ServiceEvent::FileOperation { response, .. } => {
                files.apply(self.id, response)?;
                if let (Some(document), FileOperationResponse::Renamed { file_name, new_file_name }) =
                    (document.as_deref_mut(), response)
                {
                    self.rename_document_file(document, file_name, new_file_name);
                }
                self.emit(EnvironmentEvent::FileOperationApplied { response: response.clone() });
            }
        }
        Ok(Delivery::Applied)
    }

    pub(crate) fn install_subscription(&self, subscription: Subscription, pump: JoinHandle<()>) {
        let previous = self.subscription.lock().expect("subscription lock poisoned").replace(subscription);
        if let Some(previous) = previous {
            previous.dispose();
        }
        if let Some(previous) = self.pump.lock().expect("pump lock poisoned").replace(pump) {
            previous.abort();
        }
    }

    /// Release the bus subscription and stop delivery. Idempotent. When this
    /// returns, no further event is applied to this environment.
    pub async fn dispose(&self) {
        let subscription = self.subscription.lock().expect("subscription lock poisoned").take();
        if let Some(subscription) = subscription {
            subscription.dispose();
        }

        {
            let mut state = self.state.lock().await;
            if state.disposed {
                return;
            }
            state.disposed = true;
        }

        if let Some(pump) = self.pump.lock().expect("pump lock poisoned").take() {
            pump.abort();
        }
        debug!(script_id = %self.id, "script environment disposed");
    }

    fn apply_status(
        &self,
        state: &mut EnvironmentState,
        to: ScriptStatus,
    ) -> Result<StatusTransition, EnvironmentError> {
        let from = state.status;
        let results_cleared = transition_clears_results(from, to)?;
        if from == to {
            return Ok(StatusTransition { from, to, results_cleared });
        }

        state.status = to;
        self.emit(EnvironmentEvent::StatusChanged { from, to, at: Utc::now() });
        if results_cleared {
            state.output.clear();
            self.emit(EnvironmentEvent::ResultsCleared);
        }
        Ok(StatusTransition { from, to, results_cleared })
    }

    fn rename_document_file(&self, document: &mut ScriptDocument, file_name: &str, new_file_name: &str) {
        let Some(path) = document.file_path() else {
            return;
        };
        if path.file_name() != Some(Path::new(file_name).as_os_str()) {
            return;
        }
        let renamed = path.with_file_name(new_file_name);
        document.set_file_path(renamed);
        debug!(script_id = %self.id, name = document.name(), "script document renamed");
        self.emit(EnvironmentEvent::DocumentRenamed { name: document.name().to_string() });
    }

    fn emit(&self, event: EnvironmentEvent) {
        // No observers is fine.
        let _ = self.observers.send(event);
    }
}

/// Validate a transition and report whether it clears accumulated results.
pub fn transition_clears_results(
    from: ScriptStatus,
    to: ScriptStatus,
) -> Result<bool, EnvironmentError> {
    match (from, to) {
        (_, ScriptStatus::Running) => Ok(from != ScriptStatus::Running),
        (ScriptStatus::Running, ScriptStatus::Completed | ScriptStatus::Error) => Ok(false),
        _ => Err(EnvironmentError::InvalidTransition { from, to }),
    }
}

impl std::fmt::Debug for ScriptEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptEnvironment").field("id", &self.id).finish_non_exhaustive()
    }
}
