// Integration test: script lifecycle through a session.
//
// create → edit → save → close → reopen from disk → close, checking the
// registry, the bus subscriptions and the saved file along the way.

use std::time::Duration;

use scriptpad_common::protocol::events::ServiceEvent;
use scriptpad_daemon::config::DaemonConfig;
use scriptpad_daemon::engine::EnvironmentEvent;
use scriptpad_daemon::session::{ScriptSession, SessionError};
use tempfile::TempDir;

fn session_in(dir: &TempDir) -> ScriptSession {
    let config = DaemonConfig {
        scripts_directory_path: dir.path().to_path_buf(),
        ..DaemonConfig::default()
    };
    ScriptSession::new(config, None)
}

#[tokio::test]
async fn create_save_close_and_reopen() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);

    let env = session.create("Numbers").await;
    let id = env.id();
    session.set_namespaces(id, ["System.Numerics", " ", "System.Numerics"]).await.unwrap();
    session.update_code(id, Some("Console.WriteLine(BigInteger.One);".into())).await.unwrap();
    assert!(env.document().await.is_dirty());

    let path = session.save(id).await.unwrap();
    assert_eq!(path, dir.path().join("Numbers.spad"));
    assert!(!env.document().await.is_dirty());

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(&format!("{id}\n")));
    assert!(text.contains("\n#Query\n"));
    assert!(!text.contains("Numbers\""), "name must not be persisted");

    session.close(id).await.unwrap();
    assert!(session.registry().is_empty().await);
    assert_eq!(session.bus().subscriber_count(id), 0);

    let reopened = session.open(&path).await.unwrap();
    assert_eq!(reopened.id(), id);
    let document = reopened.document().await;
    assert_eq!(document.name(), "Numbers");
    assert_eq!(document.config().namespaces, vec!["System.Numerics", "System.Numerics"]);
    assert_eq!(document.code(), "Console.WriteLine(BigInteger.One);");
    assert!(!document.is_dirty());

    let program = document.runnable_code();
    assert_eq!(program.matches("using System.Numerics;").count(), 1);
}

#[tokio::test]
async fn opening_an_open_script_returns_the_same_environment() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    let env = session.create("Twice").await;
    let path = session.save(env.id()).await.unwrap();

    let again = session.open(&path).await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&env, &again));
    assert_eq!(session.registry().len().await, 1);
    assert_eq!(session.bus().subscriber_count(env.id()), 1);
}

#[tokio::test]
async fn resaving_an_existing_script_writes_in_place() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    let env = session.create("Edit").await;
    let id = env.id();
    let first = session.save(id).await.unwrap();

    env.document().await.set_file_path(dir.path().join("Renamed.spad"));
    session.update_code(id, Some("x();".into())).await.unwrap();
    let second = session.save(id).await.unwrap();

    assert_eq!(second, dir.path().join("Renamed.spad"));
    assert!(first.exists());
    assert!(std::fs::read_to_string(&second).unwrap().ends_with("x();"));
    assert_eq!(env.document().await.name(), "Renamed");
}

#[tokio::test]
async fn closed_script_receives_no_further_events() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    let env = session.create("Closing").await;
    let id = env.id();
    let mut observer = env.subscribe();

    assert_eq!(session.bridge().publish(ServiceEvent::output(id, "before")), 1);
    let event = tokio::time::timeout(Duration::from_secs(5), observer.recv()).await.unwrap().unwrap();
    assert_eq!(event, EnvironmentEvent::OutputAppended { output: "before".into() });

    session.close(id).await.unwrap();
    assert_eq!(session.bridge().publish(ServiceEvent::output(id, "after")), 0);
    tokio::task::yield_now().await;
    assert_eq!(env.output().await, vec!["before"]);
}

#[tokio::test]
async fn opening_a_malformed_file_fails_without_an_environment() {
    let dir = TempDir::new().unwrap();
    let session = session_in(&dir);
    let path = dir.path().join("Broken.spad");
    std::fs::write(&path, "not a script").unwrap();

    let error = session.open(&path).await.unwrap_err();
    assert!(matches!(error, SessionError::Document(_)));
    assert!(session.registry().is_empty().await);
}
