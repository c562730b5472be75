//! JSON-RPC driver
//!
//! Talks to an accessibility backend process over stdin/stdout, one JSON
//! object per line. The backend receives finders in their serialized form
//! and reports lookup failures with dedicated error codes.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use super::node::{MouseClick, NodeInfo, Point, Rect, ScrollDirection};
use super::{Driver, DriverError};
use crate::finder::Finder;

/// Error codes the backend uses for lookup failures
pub const CODE_NOT_FOUND: i32 = -32001;
pub const CODE_AMBIGUOUS: i32 = -32002;
pub const CODE_INVALID_QUERY: i32 = -32003;
pub const CODE_UNSUPPORTED: i32 = -32004;

/// JSON-RPC request
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

/// JSON-RPC response
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[allow(dead_code)]
    pub jsonrpc: String,
    pub id: u64,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

/// JSON-RPC error
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl From<RpcError> for DriverError {
    fn from(err: RpcError) -> Self {
        match err.code {
            CODE_NOT_FOUND => DriverError::NotFound(err.message),
            CODE_AMBIGUOUS => DriverError::Ambiguous(err.message),
            CODE_INVALID_QUERY => DriverError::InvalidQuery(err.message),
            CODE_UNSUPPORTED => DriverError::Unsupported(err.message),
            code => DriverError::ServerError(format!("[{}] {}", code, err.message)),
        }
    }
}

type Reply = oneshot::Sender<Result<Value, DriverError>>;

/// Request sender type alias
pub type RequestSender = mpsc::Sender<(RpcRequest, Reply)>;

static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Create a new RPC request with auto-incremented ID
pub fn new_request(method: &str, params: Value) -> RpcRequest {
    RpcRequest {
        jsonrpc: "2.0",
        id: REQUEST_ID.fetch_add(1, Ordering::SeqCst),
        method: method.to_string(),
        params,
    }
}

pub struct RpcDriver {
    request_tx: RequestSender,
    #[allow(dead_code)]
    child: Option<Child>,
}

impl RpcDriver {
    /// Spawn the backend `program` (looked up on `PATH` when not a path) and
    /// connect to its stdio.
    pub async fn start(program: &str, args: &[String]) -> Result<Self, DriverError> {
        let resolved = which::which(program)
            .map_err(|e| DriverError::StartupFailed(format!("{}: {}", program, e)))?;
        info!("Starting accessibility backend: {}", resolved.display());

        let mut child = Command::new(&resolved)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DriverError::StartupFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::StartupFailed("backend stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::StartupFailed("backend stdout unavailable".into()))?;

        let (request_tx, request_rx) = mpsc::channel(100);
        spawn_communication_task(request_rx, stdin, stdout);

        Ok(Self {
            request_tx,
            child: Some(child),
        })
    }

    /// Use an already running transport. The caller owns the backend.
    pub fn from_sender(request_tx: RequestSender) -> Self {
        Self {
            request_tx,
            child: None,
        }
    }

    #[instrument(level = "debug", skip(self, params))]
    async fn request(&self, method: &str, params: Value) -> Result<Value, DriverError> {
        let req = new_request(method, params);
        debug!(id = req.id, "rpc request");
        let (tx, rx) = oneshot::channel();
        self.request_tx
            .send((req, tx))
            .await
            .map_err(|_| DriverError::Disconnected)?;
        rx.await.map_err(|_| DriverError::Disconnected)?
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, DriverError> {
        let value = self.request(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn call_on(&self, method: &str, finder: &Finder) -> Result<(), DriverError> {
        self.request(method, json!({ "finder": finder })).await?;
        Ok(())
    }
}

/// Spawn the background task that writes requests to the backend's stdin
/// and routes responses from its stdout back to the waiting callers
pub fn spawn_communication_task(
    mut request_rx: mpsc::Receiver<(RpcRequest, Reply)>,
    stdin: ChildStdin,
    stdout: ChildStdout,
) {
    tokio::spawn(async move {
        let mut stdin = stdin;
        let mut reader = BufReader::new(stdout);
        let mut pending: HashMap<u64, Reply> = HashMap::new();
        let mut line = String::new();

        loop {
            tokio::select! {
                request = request_rx.recv() => {
                    match request {
                        Some((req, response_tx)) => {
                            let id = req.id;
                            let json = match serde_json::to_string(&req) {
                                Ok(json) => json + "\n",
                                Err(e) => {
                                    let _ = response_tx.send(Err(e.into()));
                                    continue;
                                }
                            };
                            if stdin.write_all(json.as_bytes()).await.is_err() {
                                let _ = response_tx.send(Err(DriverError::Disconnected));
                                break;
                            }
                            pending.insert(id, response_tx);
                        }
                        None => break,
                    }
                }

                result = reader.read_line(&mut line) => {
                    match result {
                        Ok(0) => break,
                        Ok(_) => {
                            match serde_json::from_str::<RpcResponse>(&line) {
                                Ok(response) => {
                                    if let Some(tx) = pending.remove(&response.id) {
                                        let result = match response.error {
                                            Some(err) => Err(err.into()),
                                            None => Ok(response.result.unwrap_or(Value::Null)),
                                        };
                                        let _ = tx.send(result);
                                    }
                                }
                                Err(e) => warn!("Ignoring malformed backend line: {}", e),
                            }
                            line.clear();
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    });
}

#[async_trait]
impl Driver for RpcDriver {
    async fn snapshot(&self, finder: &Finder) -> Result<NodeInfo, DriverError> {
        self.call("node.snapshot", json!({ "finder": finder })).await
    }

    async fn snapshot_all(&self, finder: &Finder) -> Result<Vec<NodeInfo>, DriverError> {
        self.call("node.snapshotAll", json!({ "finder": finder })).await
    }

    async fn location(&self, finder: &Finder) -> Result<Rect, DriverError> {
        self.call("node.location", json!({ "finder": finder })).await
    }

    async fn mouse_click(&self, point: Point, click: MouseClick) -> Result<(), DriverError> {
        self.request("mouse.click", json!({ "x": point.x, "y": point.y, "click": click }))
            .await?;
        Ok(())
    }

    async fn do_default(&self, finder: &Finder) -> Result<(), DriverError> {
        self.call_on("node.doDefault", finder).await
    }

    async fn focus(&self, finder: &Finder) -> Result<(), DriverError> {
        self.call_on("node.focus", finder).await
    }

    async fn make_visible(&self, finder: &Finder) -> Result<(), DriverError> {
        self.call_on("node.makeVisible", finder).await
    }

    async fn scroll(&self, finder: &Finder, direction: ScrollDirection) -> Result<(), DriverError> {
        self.request("node.scroll", json!({ "finder": finder, "direction": direction }))
            .await?;
        Ok(())
    }

    async fn dump_tree(&self) -> Result<String, DriverError> {
        let result = self.request("tree.dump", json!({})).await?;
        result["tree"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| DriverError::ServerError("No tree returned".to_string()))
    }

    async fn capture_screenshot(&self, path: &Path) -> Result<bool, DriverError> {
        match self
            .request("screen.capture", json!({ "path": path.display().to_string() }))
            .await
        {
            Ok(_) => Ok(true),
            Err(DriverError::Unsupported(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
