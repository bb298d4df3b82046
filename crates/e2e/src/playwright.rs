//! Playwright browser automation
//!
//! The browser is driven by a long-lived Node process running the embedded
//! `driver/driver.js`. Requests go out on its stdin as JSON lines and
//! replies come back on stdout, matched by id. Unsolicited event lines
//! (dialogs) are routed to the [`DialogRouter`] from the reader task, which
//! answers them immediately so the action that raised the dialog can finish.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::dialog::{DialogKind, DialogRouter, PageId, Resolution, UnhandledDialogPolicy};
use crate::error::{E2eError, E2eResult};

const DRIVER_SCRIPT: &str = include_str!("../driver/driver.js");

/// Extra time the host waits for a reply beyond the operation's own timeout
const REPLY_GRACE: Duration = Duration::from_secs(5);

pub type ContextId = u64;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Delay Playwright inserts before each operation (debugging aid)
    pub slow_mo_ms: u64,

    pub ignore_https_errors: bool,

    /// Node executable
    pub node_binary: PathBuf,

    /// `node_modules` directory that contains `playwright` (exported as NODE_PATH)
    pub node_path: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            slow_mo_ms: 0,
            ignore_https_errors: false,
            node_binary: PathBuf::from("node"),
            node_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Incoming {
    Reply(Reply),
    Event(DriverEvent),
}

#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum DriverEvent {
    Ready {
        #[serde(default)]
        version: String,
    },
    Fatal {
        message: String,
    },
    Dialog {
        page: PageId,
        dialog: u64,
        kind: DialogKind,
        message: String,
        #[serde(default)]
        default_value: String,
    },
    Log {
        message: String,
    },
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Reply>>>>;

/// Handle to the running driver process
pub struct Driver {
    outbound: mpsc::UnboundedSender<String>,
    pending: Pending,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    dialogs: Arc<DialogRouter>,
    child: Mutex<Option<Child>>,
    _staging: tempfile::TempDir,
}

impl Driver {
    /// Spawn the driver and wait until the browser is up.
    pub async fn launch(
        config: &PlaywrightConfig,
        unhandled_dialog: UnhandledDialogPolicy,
        launch_timeout: Duration,
    ) -> E2eResult<Arc<Self>> {
        Self::check_node_installed(config)?;

        let staging = tempfile::tempdir()?;
        let script_path = staging.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        let mut cmd = TokioCommand::new(&config.node_binary);
        cmd.arg(&script_path)
            .arg(serde_json::to_string(config)?)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(node_path) = &config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        info!("Launching {} via Playwright driver", config.browser.as_str());
        let mut child = cmd
            .spawn()
            .map_err(|e| E2eError::DriverStartup(format!("spawning {}: {}", config.node_binary.display(), e)))?;

        let stdin = child.stdin.take().ok_or_else(|| E2eError::DriverStartup("no stdin".into()))?;
        let stdout = child.stdout.take().ok_or_else(|| E2eError::DriverStartup("no stdout".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "acs_e2e::driver", "{}", line);
                }
            });
        }

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let next_id = Arc::new(AtomicU64::new(1));
        let closed = Arc::new(AtomicBool::new(false));
        let dialogs = Arc::new(DialogRouter::new(unhandled_dialog));

        tokio::spawn(write_loop(stdin, outbound_rx));
        tokio::spawn(
            ReadLoop {
                pending: pending.clone(),
                next_id: next_id.clone(),
                closed: closed.clone(),
                dialogs: dialogs.clone(),
                outbound: outbound.clone(),
                ready: Some(ready_tx),
            }
            .run(stdout),
        );

        let driver = Arc::new(Self {
            outbound,
            pending,
            next_id,
            closed,
            dialogs,
            child: Mutex::new(Some(child)),
            _staging: staging,
        });

        match tokio::time::timeout(launch_timeout, ready_rx).await {
            Ok(Ok(Ok(version))) => {
                info!("Browser ready ({})", version);
                Ok(driver)
            }
            Ok(Ok(Err(message))) => Err(E2eError::DriverStartup(message)),
            Ok(Err(_)) => Err(E2eError::DriverStartup("driver exited before it was ready".into())),
            Err(_) => Err(E2eError::DriverStartup(format!(
                "browser not ready after {:?}",
                launch_timeout
            ))),
        }
    }

    /// Check that Node is available
    fn check_node_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let status = Command::new(&config.node_binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::NodeNotFound),
        }
    }

    pub fn dialogs(&self) -> &Arc<DialogRouter> {
        &self.dialogs
    }

    /// Send a request and wait for its reply.
    ///
    /// `timeout` is the operation's own bound (also passed to Playwright);
    /// the host gives up a little later so Playwright's error wins the race.
    pub async fn call(&self, method: &str, params: Value, timeout: Duration) -> E2eResult<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(E2eError::DriverClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let line = serde_json::to_string(&json!({ "id": id, "method": method, "params": params }))?;
        if self.outbound.send(line).is_err() {
            self.pending.lock().remove(&id);
            return Err(E2eError::DriverClosed);
        }

        match tokio::time::timeout(timeout + REPLY_GRACE, rx).await {
            Ok(Ok(reply)) if reply.ok => Ok(reply.result),
            Ok(Ok(reply)) => Err(classify_failure(method, reply.error.unwrap_or_default())),
            Ok(Err(_)) => Err(E2eError::DriverClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(E2eError::Timeout(format!("{} (no reply within {:?})", method, timeout + REPLY_GRACE)))
            }
        }
    }

    /// Open a fresh browser context (its own cookies and storage)
    pub async fn new_context(&self, default_timeout: Duration) -> E2eResult<ContextId> {
        let result = self
            .call("newContext", json!({ "timeout": default_timeout.as_millis() as u64 }), default_timeout)
            .await?;
        id_field(&result, "context")
    }

    pub async fn close_context(&self, context: ContextId) -> E2eResult<()> {
        self.call("closeContext", json!({ "context": context }), Duration::from_secs(10))
            .await?;
        Ok(())
    }

    /// Open a page in `context` and start routing its dialogs.
    pub async fn new_page(&self, context: ContextId, timeout: Duration) -> E2eResult<PageId> {
        let result = self.call("newPage", json!({ "context": context }), timeout).await?;
        let page = id_field(&result, "page")?;
        self.dialogs.register_page(page);
        Ok(page)
    }

    pub async fn close_page(&self, page: PageId) -> E2eResult<()> {
        let result = self.call("closePage", json!({ "page": page }), Duration::from_secs(10)).await;
        self.dialogs.remove_page(page);
        result.map(|_| ())
    }

    /// Close the browser and reap the process.
    pub async fn shutdown(&self) -> E2eResult<()> {
        if let Err(e) = self.call("shutdown", json!({}), Duration::from_secs(5)).await {
            debug!("Driver shutdown request: {}", e);
        }

        let child = self.child.lock().take();
        if let Some(mut child) = child {
            match tokio::time::timeout(Duration::from_secs(5), child.wait()).await {
                Ok(status) => debug!("Driver exited: {:?}", status),
                Err(_) => {
                    warn!("Driver did not exit, killing it");
                    let _ = child.kill().await;
                }
            }
        }
        Ok(())
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.lock().take() {
            // Ask the browser to exit cleanly before the hard kill
            #[cfg(unix)]
            {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;

                if let Some(pid) = child.id() {
                    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
                }
            }
            let _ = child.start_kill();
        }
    }
}

fn id_field(value: &Value, key: &str) -> E2eResult<u64> {
    value
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| E2eError::Playwright(format!("reply without '{}': {}", key, value)))
}

/// Playwright reports expired waits as "Timeout NNNms exceeded"
fn classify_failure(method: &str, message: String) -> E2eError {
    if message.contains("Timeout") && message.contains("exceeded") {
        E2eError::Timeout(format!("{}: {}", method, message))
    } else {
        E2eError::Playwright(format!("{}: {}", method, message))
    }
}

async fn write_loop(mut stdin: ChildStdin, mut outbound: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = outbound.recv().await {
        let written = async {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await
        }
        .await;

        if let Err(e) = written {
            warn!("Driver stdin closed: {}", e);
            break;
        }
    }
}

struct ReadLoop {
    pending: Pending,
    next_id: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
    dialogs: Arc<DialogRouter>,
    outbound: mpsc::UnboundedSender<String>,
    ready: Option<oneshot::Sender<Result<String, String>>>,
}

impl ReadLoop {
    async fn run(mut self, stdout: ChildStdout) {
        let mut lines = BufReader::new(stdout).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => self.handle_line(&line),
                Ok(None) => break,
                Err(e) => {
                    error!("Reading driver output: {}", e);
                    break;
                }
            }
        }

        self.closed.store(true, Ordering::SeqCst);
        if let Some(ready) = self.ready.take() {
            let _ = ready.send(Err("driver exited during startup".into()));
        }
        // Dropping the senders fails every in-flight call with DriverClosed
        self.pending.lock().clear();
        debug!("Driver output closed");
    }

    fn handle_line(&mut self, line: &str) {
        let incoming: Incoming = match serde_json::from_str(line) {
            Ok(incoming) => incoming,
            Err(_) => {
                debug!(target: "acs_e2e::driver", "{}", line);
                return;
            }
        };

        match incoming {
            Incoming::Reply(reply) => {
                let waiter = self.pending.lock().remove(&reply.id);
                match waiter {
                    Some(tx) => {
                        let _ = tx.send(reply);
                    }
                    None => debug!("Reply {} had no waiter", reply.id),
                }
            }
            Incoming::Event(DriverEvent::Ready { version }) => {
                if let Some(ready) = self.ready.take() {
                    let _ = ready.send(Ok(version));
                }
            }
            Incoming::Event(DriverEvent::Fatal { message }) => {
                error!("Driver failed: {}", message);
                if let Some(ready) = self.ready.take() {
                    let _ = ready.send(Err(message));
                }
            }
            Incoming::Event(DriverEvent::Dialog { page, dialog, kind, message, default_value }) => {
                let resolution = self.dialogs.dispatch(page, kind, &message, &default_value);
                self.resolve_dialog(dialog, resolution);
            }
            Incoming::Event(DriverEvent::Log { message }) => {
                debug!(target: "acs_e2e::driver", "{}", message);
            }
        }
    }

    /// Fire-and-forget; the reply is dropped as unmatched.
    fn resolve_dialog(&self, dialog: u64, resolution: Resolution) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let params = match resolution {
            Resolution::Accept { prompt_text } => json!({ "dialog": dialog, "accept": true, "prompt_text": prompt_text }),
            Resolution::Dismiss => json!({ "dialog": dialog, "accept": false }),
        };
        let request = json!({ "id": id, "method": "resolveDialog", "params": params });
        if self.outbound.send(request.to_string()).is_err() {
            warn!("Could not resolve dialog {}: driver closed", dialog);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_replies_and_events() {
        let reply: Incoming = serde_json::from_str(r#"{"id":3,"ok":true,"result":{"page":1}}"#).unwrap();
        assert!(matches!(reply, Incoming::Reply(Reply { id: 3, ok: true, .. })));

        let failure: Incoming = serde_json::from_str(r#"{"id":4,"ok":false,"error":"boom"}"#).unwrap();
        assert!(matches!(failure, Incoming::Reply(Reply { ok: false, error: Some(_), .. })));

        let dialog: Incoming = serde_json::from_str(
            r#"{"event":"dialog","page":2,"dialog":9,"kind":"confirm","message":"삭제하시겠습니까?","default_value":""}"#,
        )
        .unwrap();
        assert!(matches!(
            dialog,
            Incoming::Event(DriverEvent::Dialog { page: 2, dialog: 9, kind: DialogKind::Confirm, .. })
        ));

        let ready: Incoming = serde_json::from_str(r#"{"event":"ready","version":"120.0"}"#).unwrap();
        assert!(matches!(ready, Incoming::Event(DriverEvent::Ready { .. })));
    }

    #[test]
    fn playwright_timeouts_are_classified() {
        let err = classify_failure("click", "locator.click: Timeout 5000ms exceeded.".into());
        assert!(matches!(err, E2eError::Timeout(_)));

        let err = classify_failure("click", "strict mode violation".into());
        assert!(matches!(err, E2eError::Playwright(_)));
    }

    #[test]
    fn driver_options_use_lowercase_browser() {
        let options = serde_json::to_value(PlaywrightConfig::default()).unwrap();
        assert_eq!(options["browser"], "chromium");
        assert_eq!(options["viewport_width"], 1280);
    }
}
