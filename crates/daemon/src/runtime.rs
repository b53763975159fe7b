// Standalone runtime: open scripts, feed the bridge from an NDJSON event
// stream and log what happens to each environment.

use std::path::PathBuf;

use anyhow::{Context, Result};
use scriptpad_common::protocol::events::ServiceEvent;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DaemonConfig;
use crate::engine::EnvironmentEvent;
use crate::session::ScriptSession;

const EVENT_STREAM_CAPACITY: usize = 1024;

pub async fn run_standalone(scripts: Vec<PathBuf>) -> Result<()> {
    run_standalone_with_config(DaemonConfig::load(), scripts).await
}

async fn run_standalone_with_config(config: DaemonConfig, scripts: Vec<PathBuf>) -> Result<()> {
    let session = ScriptSession::new(config, None);

    let mut loggers = Vec::new();
    for path in &scripts {
        match session.open(path).await {
            Ok(environment) => {
                loggers.push(tokio::spawn(log_environment_events(environment.id(), environment.subscribe())));
            }
            Err(error) => warn!(path = %path.display(), error = %error, "failed to open script"),
        }
    }

    let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = ctrl_c_tx.send(());
    });

    let (event_tx, event_rx) = mpsc::channel(EVENT_STREAM_CAPACITY);
    let reader = tokio::spawn(read_events(tokio::io::stdin(), event_tx));

    let open = session.registry().len().await;
    info!(open, "standalone daemon started");
    session.bridge().run(event_rx, shutdown_rx).await;

    reader.abort();
    match reader.await {
        Ok(Ok(forwarded)) => debug!(forwarded, "service event reader finished"),
        Ok(Err(error)) => warn!(error = %error, "service event reader failed"),
        Err(_) => debug!("service event reader cancelled"),
    }

    let closed = session.close_all().await;
    for logger in loggers {
        logger.abort();
    }
    info!(closed, "standalone daemon stopped");
    Ok(())
}

/// Forward newline-delimited JSON service events from `reader` to `tx`.
/// Malformed lines are logged and skipped. Returns the number of events
/// forwarded.
pub async fn read_events<R>(reader: R, tx: mpsc::Sender<ServiceEvent>) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await.context("failed to read service event stream")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ServiceEvent>(line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    debug!("service event channel closed, reader exiting");
                    break;
                }
                forwarded += 1;
            }
            Err(error) => warn!(error = %error, "skipping malformed service event"),
        }
    }

    Ok(forwarded)
}

async fn log_environment_events(script_id: Uuid, mut rx: broadcast::Receiver<EnvironmentEvent>) {
    loop {
        match rx.recv().await {
            Ok(EnvironmentEvent::StatusChanged { from, to, at }) => {
                info!(script_id = %script_id, %from, %to, at = %at.to_rfc3339(), "script status changed");
            }
            Ok(EnvironmentEvent::ResultsCleared) => info!(script_id = %script_id, "results cleared"),
            Ok(EnvironmentEvent::OutputAppended { output }) => {
                info!(script_id = %script_id, output = %output, "script output");
            }
            Ok(EnvironmentEvent::DiagnosticsUpdated { diagnostics }) => {
                info!(script_id = %script_id, diagnostics = %diagnostics, "diagnostics updated");
            }
            Ok(EnvironmentEvent::FileOperationApplied { response }) => {
                info!(
                    script_id = %script_id,
                    file_name = response.file_name(),
                    modification = ?response.modification_type(),
                    "file operation applied"
                );
            }
            Ok(EnvironmentEvent::DocumentRenamed { name }) => {
                info!(script_id = %script_id, name = %name, "script renamed");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(script_id = %script_id, skipped, "environment observer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
