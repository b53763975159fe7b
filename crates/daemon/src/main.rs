// scriptpadd: standalone mode entry point.

use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let scripts: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    info!(scripts = scripts.len(), "starting standalone scriptpad daemon");
    scriptpad_daemon::runtime::run_standalone(scripts)
        .await
        .context("standalone daemon terminated unexpectedly")
}
