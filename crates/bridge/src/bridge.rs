//! The Capability Bridge: list, invoke, and read capabilities of an exported
//! worker through short-lived MCP sessions.
//!
//! Every call opens a fresh session (spawn, handshake, one operation, drop).
//! The bridge runs the worker itself; it never talks to the orchestrator's
//! long-lived process, so a stopped target can still be inspected as long as
//! its source has been exported.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use capforge_core::error::{BridgeError, Result};
use capforge_core::fragment::FragmentKind;
use capforge_core::workspace::WorkspaceLayout;

use crate::session::WorkerSession;

/// Bridge tuning knobs.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Root directory where exported worker directories live.
    pub workers_dir: PathBuf,

    /// Command template launching a worker; `{file}` is replaced with the
    /// generated source file name.
    pub worker_command: Vec<String>,

    /// Per-session deadline covering the handshake and each request.
    pub session_timeout: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            workers_dir: PathBuf::from("workers"),
            worker_command: vec!["uv".into(), "run".into(), "{file}".into()],
            session_timeout: Duration::from_secs(30),
        }
    }
}

/// Opens request-scoped MCP sessions against exported workers.
pub struct CapabilityBridge {
    options: BridgeOptions,
    layout: WorkspaceLayout,
}

impl CapabilityBridge {
    pub fn new(options: BridgeOptions) -> Self {
        let layout = WorkspaceLayout::new(options.workers_dir.clone());
        Self { options, layout }
    }

    /// List the capabilities of one kind exposed by the target's worker.
    pub async fn list(&self, target_id: &str, kind: FragmentKind) -> Result<Vec<Value>> {
        let (method, field) = match kind {
            FragmentKind::Tool => ("tools/list", "tools"),
            FragmentKind::Resource => ("resources/list", "resources"),
            FragmentKind::Prompt => ("prompts/list", "prompts"),
        };
        let mut session = self.open_session(target_id).await?;
        let result = session.request(method, None).await?;
        match result.get(field) {
            Some(Value::Array(items)) => Ok(items.clone()),
            _ => Err(BridgeError::InferenceFailed(format!(
                "{method} response missing '{field}' array"
            ))
            .into()),
        }
    }

    /// List capabilities by kind name, rejecting unknown kinds.
    pub async fn list_by_name(&self, target_id: &str, kind: &str) -> Result<Vec<Value>> {
        let kind = FragmentKind::from_str(kind)
            .map_err(|_| BridgeError::InvalidKind(kind.to_string()))?;
        self.list(target_id, kind).await
    }

    /// Invoke a named capability of the given kind. For resources the name
    /// is the URI; arguments are ignored since resource reads take none.
    pub async fn invoke(
        &self,
        target_id: &str,
        kind: FragmentKind,
        name: &str,
        arguments: Value,
    ) -> Result<Value> {
        match kind {
            FragmentKind::Tool => self.invoke_tool(target_id, name, arguments).await,
            FragmentKind::Prompt => self.get_prompt(target_id, name, arguments).await,
            FragmentKind::Resource => self.read_resource(target_id, name).await,
        }
    }

    /// Invoke a tool with the given arguments and return the MCP call result.
    pub async fn invoke_tool(
        &self,
        target_id: &str,
        name: &str,
        arguments: Value,
    ) -> Result<Value> {
        let mut session = self.open_session(target_id).await?;
        let params = json!({ "name": name, "arguments": arguments });
        Ok(session.request("tools/call", Some(params)).await?)
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, target_id: &str, uri: &str) -> Result<Value> {
        let mut session = self.open_session(target_id).await?;
        Ok(session
            .request("resources/read", Some(json!({ "uri": uri })))
            .await?)
    }

    /// Render a prompt with the given arguments.
    pub async fn get_prompt(
        &self,
        target_id: &str,
        name: &str,
        arguments: Value,
    ) -> Result<Value> {
        let mut session = self.open_session(target_id).await?;
        let params = json!({ "name": name, "arguments": arguments });
        Ok(session.request("prompts/get", Some(params)).await?)
    }

    /// A session requires an exported source on disk; without one there is
    /// nothing to launch.
    async fn open_session(&self, target_id: &str) -> Result<WorkerSession> {
        let source = self.layout.source_file(target_id);
        if !source.exists() {
            return Err(BridgeError::WorkerNotExported {
                target_id: target_id.to_string(),
            }
            .into());
        }
        let dir = self.layout.target_dir(target_id);
        let file_name = self.layout.source_file_name(target_id);
        debug!(target_id = %target_id, "Opening worker session");
        Ok(WorkerSession::open(
            &self.options.worker_command,
            &dir,
            &file_name,
            self.options.session_timeout,
        )
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capforge_core::Error;

    fn sh_available() -> bool {
        std::process::Command::new("sh")
            .args(["-c", "exit 0"])
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Options pointing at a temp workers root, running workers with `sh`.
    fn sh_bridge(root: &std::path::Path) -> CapabilityBridge {
        CapabilityBridge::new(BridgeOptions {
            workers_dir: root.to_path_buf(),
            worker_command: vec!["sh".into(), "{file}".into()],
            session_timeout: Duration::from_secs(5),
        })
    }

    /// Export a fake worker script for target `t1` under `root`.
    async fn export_fake_worker(root: &std::path::Path, body: &str) {
        let layout = WorkspaceLayout::new(root);
        tokio::fs::create_dir_all(layout.target_dir("t1")).await.unwrap();
        tokio::fs::write(layout.source_file("t1"), body).await.unwrap();
    }

    const HANDSHAKE: &str = r#"read line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"fake","version":"0"}}}'
read line
"#;

    #[tokio::test]
    async fn unexported_target_is_rejected_without_spawning() {
        let root = tempfile::tempdir().unwrap();
        let bridge = sh_bridge(root.path());

        let err = bridge.list("ghost", FragmentKind::Tool).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Bridge(BridgeError::WorkerNotExported { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_kind_name_is_invalid() {
        let root = tempfile::tempdir().unwrap();
        let bridge = sh_bridge(root.path());

        let err = bridge.list_by_name("t1", "widget").await.unwrap_err();
        match err {
            Error::Bridge(BridgeError::InvalidKind(kind)) => assert_eq!(kind, "widget"),
            other => panic!("expected InvalidKind, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_tools_extracts_the_catalog() {
        if !sh_available() {
            eprintln!("skipping: sh not found");
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let script = format!(
            "{HANDSHAKE}read line\nprintf '%s\\n' '{}'\n",
            r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"add_numbers"},{"name":"shout"}]}}"#
        );
        export_fake_worker(root.path(), &script).await;

        let bridge = sh_bridge(root.path());
        let tools = bridge.list("t1", FragmentKind::Tool).await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "add_numbers");
    }

    #[tokio::test]
    async fn invoke_tool_passes_name_and_arguments() {
        if !sh_available() {
            eprintln!("skipping: sh not found");
            return;
        }
        let root = tempfile::tempdir().unwrap();
        // Echoes the tools/call request line back inside the result so the
        // test can assert what went over the wire.
        let script = format!(
            "{HANDSHAKE}read line\nprintf '{}' \"$line\"\n",
            r#"{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"7"}],"echo":%s}}\n"#
        );
        export_fake_worker(root.path(), &script).await;

        let bridge = sh_bridge(root.path());
        let result = bridge
            .invoke_tool("t1", "add_numbers", json!({"a": 3, "b": 4}))
            .await
            .unwrap();
        assert_eq!(result["content"][0]["text"], "7");
        assert_eq!(result["echo"]["params"]["name"], "add_numbers");
        assert_eq!(result["echo"]["params"]["arguments"]["a"], 3);
    }

    #[tokio::test]
    async fn invoke_dispatches_prompts_to_prompts_get() {
        if !sh_available() {
            eprintln!("skipping: sh not found");
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let script = format!(
            "{HANDSHAKE}read line\nprintf '{}' \"$line\"\n",
            r#"{"jsonrpc":"2.0","id":2,"result":{"messages":[],"echo":%s}}\n"#
        );
        export_fake_worker(root.path(), &script).await;

        let bridge = sh_bridge(root.path());
        let result = bridge
            .invoke("t1", FragmentKind::Prompt, "explain", json!({"topic": "mcp"}))
            .await
            .unwrap();
        assert_eq!(result["echo"]["method"], "prompts/get");
        assert_eq!(result["echo"]["params"]["arguments"]["topic"], "mcp");
    }

    #[tokio::test]
    async fn read_resource_returns_contents() {
        if !sh_available() {
            eprintln!("skipping: sh not found");
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let script = format!(
            "{HANDSHAKE}read line\nprintf '%s\\n' '{}'\n",
            r#"{"jsonrpc":"2.0","id":2,"result":{"contents":[{"uri":"data://greeting","text":"hello"}]}}"#
        );
        export_fake_worker(root.path(), &script).await;

        let bridge = sh_bridge(root.path());
        let result = bridge.read_resource("t1", "data://greeting").await.unwrap();
        assert_eq!(result["contents"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn malformed_catalog_is_an_inference_failure() {
        if !sh_available() {
            eprintln!("skipping: sh not found");
            return;
        }
        let root = tempfile::tempdir().unwrap();
        let script = format!(
            "{HANDSHAKE}read line\nprintf '%s\\n' '{}'\n",
            r#"{"jsonrpc":"2.0","id":2,"result":{"unexpected":true}}"#
        );
        export_fake_worker(root.path(), &script).await;

        let bridge = sh_bridge(root.path());
        let err = bridge.list("t1", FragmentKind::Prompt).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Bridge(BridgeError::InferenceFailed(_))
        ));
    }
}
