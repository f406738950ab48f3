//! A single MCP stdio session against one worker process.
//!
//! Sessions are request-scoped: the caller opens one, performs the handshake
//! and one operation, and drops it. The child is spawned with kill-on-drop,
//! so an abandoned session never leaks a process.

use std::path::Path;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use capforge_core::error::BridgeError;

use crate::rpc::{PROTOCOL_VERSION, RpcNotification, RpcRequest, RpcResponse};

/// An initialized MCP session over a worker's stdin/stdout.
#[derive(Debug)]
pub struct WorkerSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    timeout: Duration,
}

impl WorkerSession {
    /// Launch the worker with the given command, run the MCP handshake, and
    /// return a ready session. The command runs inside `dir`; `{file}` in
    /// the command expands to `file_name`.
    pub async fn open(
        command: &[String],
        dir: &Path,
        file_name: &str,
        timeout: Duration,
    ) -> Result<Self, BridgeError> {
        let argv: Vec<String> = command
            .iter()
            .map(|part| part.replace("{file}", file_name))
            .collect();
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BridgeError::InferenceFailed("empty worker command".into()))?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BridgeError::InferenceFailed(format!("failed to launch worker: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::InferenceFailed("failed to capture worker stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::InferenceFailed("failed to capture worker stdout".into()))?;

        let mut session = Self {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            timeout,
        };
        session.initialize().await?;
        Ok(session)
    }

    /// MCP handshake: `initialize` request, then the `notifications/initialized`
    /// notification that unlocks the server for operations.
    async fn initialize(&mut self) -> Result<(), BridgeError> {
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": "capforge",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        self.request("initialize", Some(params)).await?;
        self.notify("notifications/initialized", None).await?;
        Ok(())
    }

    /// Send one request and wait for its response, skipping any interleaved
    /// server notifications. Returns the `result` payload.
    pub async fn request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, BridgeError> {
        let id = self.next_id;
        self.next_id += 1;
        let request = RpcRequest::new(id, method, params);
        self.write_line(&request).await?;

        let deadline = self.timeout;
        let response = tokio::time::timeout(deadline, self.read_response(id))
            .await
            .map_err(|_| {
                BridgeError::InferenceFailed(format!("{method} timed out after {deadline:?}"))
            })??;

        if let Some(err) = response.error {
            return Err(BridgeError::InferenceFailed(format!(
                "{method} failed: {} (code {})",
                err.message, err.code
            )));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), BridgeError> {
        let note = RpcNotification::new(method, params);
        self.write_line(&note).await
    }

    async fn write_line<T: serde::Serialize>(&mut self, message: &T) -> Result<(), BridgeError> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| BridgeError::InferenceFailed(format!("encode request: {e}")))?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| BridgeError::InferenceFailed(format!("worker stdin closed: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| BridgeError::InferenceFailed(format!("worker stdin closed: {e}")))?;
        Ok(())
    }

    async fn read_response(&mut self, id: u64) -> Result<RpcResponse, BridgeError> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| BridgeError::InferenceFailed(format!("worker stdout: {e}")))?
                .ok_or_else(|| {
                    BridgeError::InferenceFailed("worker closed its stdout".into())
                })?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let response: RpcResponse = match serde_json::from_str(trimmed) {
                Ok(response) => response,
                Err(_) => {
                    // Workers may print banners before speaking the protocol.
                    debug!(line = %trimmed, "Skipping non-protocol output");
                    continue;
                }
            };
            if response.id != Some(id) {
                debug!(method_id = id, got = ?response.id, "Skipping unrelated message");
                continue;
            }
            return Ok(response);
        }
    }
}
