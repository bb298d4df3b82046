//! Harness and scenario behaviour against a scripted driver process
//!
//! A small shell script stands in for `node driver.js`: it answers every
//! request from a fixed table and appends each request line to a log, so
//! tests can check what the Rust side asked the browser to do.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use acs_e2e::lifecycle::{EntityState, Lifecycle};
use acs_e2e::scenario::employee;
use acs_e2e::session::Harness;
use acs_e2e::{E2eConfig, E2eError};

const RESPONDER: &str = r#"echo '{"event":"ready","version":"scripted"}'
while IFS= read -r line; do
  printf '%s\n' "$line" >> '@LOG@'
  id=$(printf '%s\n' "$line" | sed -n 's/^{"id":\([0-9]*\),"method":"\([A-Za-z]*\)".*/\1/p')
  method=$(printf '%s\n' "$line" | sed -n 's/^{"id":\([0-9]*\),"method":"\([A-Za-z]*\)".*/\2/p')
  case "$method" in
    newContext) echo "{\"id\":$id,\"ok\":true,\"result\":{\"context\":1}}" ;;
    newPage) echo "{\"id\":$id,\"ok\":true,\"result\":{\"page\":7}}" ;;
    waitForUrl) echo "{\"id\":$id,\"ok\":true,\"result\":\"http://console.test/dashboard\"}" ;;
    closePage) echo "{\"id\":$id,\"ok\":false,\"error\":\"Target page has been closed\"}" ;;
    shutdown) echo "{\"id\":$id,\"ok\":true,\"result\":null}"; exit 0 ;;
    *) echo "{\"id\":$id,\"ok\":true,\"result\":null}" ;;
  esac
done
"#;

/// Executable that passes the `--version` check and then runs `body`
fn scripted_node(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("node");
    fs::write(&path, format!("#!/bin/sh\n[ \"$1\" = \"--version\" ] && exit 0\n{}", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn config(dir: &Path, node: PathBuf) -> E2eConfig {
    let mut config = E2eConfig {
        base_url: "http://console.test".to_string(),
        report_dir: dir.join("report"),
        ..Default::default()
    };
    config.credentials.password = Some("scripted".to_string());
    config.playwright.node_binary = node;
    config.timeouts.settle_ms = 0;
    config.timeouts.launch_ms = 5_000;
    config
}

fn responder(dir: &Path) -> (E2eConfig, PathBuf) {
    let log = dir.join("requests.log");
    let body = RESPONDER.replace("@LOG@", &log.to_string_lossy());
    let node = scripted_node(dir, &body);
    (config(dir, node), log)
}

#[tokio::test]
async fn browser_that_never_gets_ready_is_fatal_every_time() {
    let dir = TempDir::new().unwrap();
    let node = scripted_node(dir.path(), "exec sleep 30\n");
    let mut config = config(dir.path(), node);
    config.timeouts.launch_ms = 300;
    let harness = Harness::new(Arc::new(config));

    let first = harness.driver().await.err().unwrap();
    assert!(matches!(first, E2eError::DriverStartup(_)), "{:?}", first);
    assert!(first.is_fatal());

    let cached = harness.driver().await.err().unwrap();
    assert!(matches!(cached, E2eError::DriverStartup(_)), "{:?}", cached);
    assert!(cached.is_fatal());
}

#[tokio::test]
async fn sign_in_survives_a_failed_page_close() {
    let dir = TempDir::new().unwrap();
    let (config, log) = responder(dir.path());
    let harness = Harness::new(Arc::new(config));

    let session = harness.session().await;
    assert!(session.is_ok(), "{:?}", session.err());

    let requests = fs::read_to_string(&log).unwrap();
    assert!(requests.contains(r#""method":"closePage""#));
    harness.shutdown().await.unwrap();
}

#[tokio::test]
async fn employee_rename_waits_for_the_old_name_to_disappear() {
    let dir = TempDir::new().unwrap();
    let (config, log) = responder(dir.path());
    let harness = Harness::new(Arc::new(config));
    let page = harness.session().await.unwrap().new_page().await.unwrap();

    let mut lifecycle = Lifecycle::new("1000508");
    lifecycle.advance(EntityState::Creating).unwrap();
    lifecycle.advance(EntityState::Created).unwrap();
    employee::rename(&page, &mut lifecycle, "Kim Before", "Kim After")
        .await
        .unwrap();
    assert_eq!(lifecycle.state(), EntityState::Edited);

    let requests = fs::read_to_string(&log).unwrap();
    let waits: Vec<&str> = requests
        .lines()
        .filter(|l| l.contains(r#""method":"waitFor""#))
        .collect();
    assert!(waits
        .iter()
        .any(|l| l.contains(r#""state":"visible""#) && l.contains(r#""name":"Kim After""#)));
    assert!(waits
        .iter()
        .any(|l| l.contains(r#""state":"hidden""#) && l.contains(r#""name":"Kim Before""#)));
    harness.shutdown().await.unwrap();
}
