//! End-to-end flow: author fragments, link them into a target, assemble the
//! worker source, supervise a launch, and interrogate an exported worker
//! over MCP stdio.
//!
//! Workers run under `sh` here so the pipeline is testable without a Python
//! toolchain; the supervision and session semantics are identical.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use capforge_assembly::assemble_target;
use capforge_bridge::{BridgeOptions, CapabilityBridge};
use capforge_core::fragment::{FragmentKind, Param};
use capforge_core::identity::Identity;
use capforge_core::worker::WorkerState;
use capforge_core::workspace::WorkspaceLayout;
use capforge_core::{Provisioner, RuntimeError};
use capforge_runtime::{LifecycleOrchestrator, RuntimeOptions, StartOutcome, StopOutcome};
use capforge_store::{InMemoryStore, NewFragment, NewTarget};

fn sh_available() -> bool {
    std::process::Command::new("sh")
        .args(["-c", "exit 0"])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

struct NoopProvisioner;

#[async_trait::async_trait]
impl Provisioner for NoopProvisioner {
    async fn ensure(&self, _env_path: &Path, _package: &str) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Build a store holding a calculator target with one fragment of each kind.
async fn calculator_store() -> (Arc<InMemoryStore>, Identity, String) {
    let store = Arc::new(InMemoryStore::new());
    let alice = Identity::user("alice");

    let mut globals = BTreeMap::new();
    globals.insert("PRECISION".to_string(), json!(2));
    let target = store
        .create_target(
            &alice,
            NewTarget {
                name: "calculator".into(),
                description: "demo calculator".into(),
                imports: vec!["import math".into()],
                globals,
            },
        )
        .await
        .unwrap();

    let resource = store
        .create_fragment(
            &alice,
            NewFragment {
                kind: FragmentKind::Resource,
                name: "greeting".into(),
                params: vec![],
                body: "@mcp.resource(\"data://greeting\")\ndef greeting() -> str:\n    return \"hello\"\n".into(),
                is_async: false,
            },
        )
        .await
        .unwrap();
    let tool = store
        .create_fragment(
            &alice,
            NewFragment {
                kind: FragmentKind::Tool,
                name: "addNumbers".into(),
                params: vec![Param::new("a", "int"), Param::new("b", "int")],
                body: "@mcp.tool()\ndef addNumbers(a, b) -> int:\n    return a + b\n".into(),
                is_async: false,
            },
        )
        .await
        .unwrap();
    let prompt = store
        .create_fragment(
            &alice,
            NewFragment {
                kind: FragmentKind::Prompt,
                name: "explain".into(),
                params: vec![Param::new("topic", "str")],
                body: "@mcp.prompt()\ndef explain(topic) -> str:\n    return f\"Explain {topic}\"\n".into(),
                is_async: false,
            },
        )
        .await
        .unwrap();

    for fragment in [&resource, &tool, &prompt] {
        store.link(&alice, &fragment.id, &target.id).await.unwrap();
    }

    (store, alice, target.id)
}

fn sh_runtime(root: &Path, store: Arc<InMemoryStore>, window_ms: u64) -> LifecycleOrchestrator {
    let options = RuntimeOptions {
        workers_dir: root.to_path_buf(),
        worker_command: vec!["sh".into(), "{file}".into()],
        crash_window: Duration::from_millis(window_ms),
        bootstrap_packages: vec![],
    };
    LifecycleOrchestrator::new(options, store, Arc::new(NoopProvisioner))
}

#[tokio::test]
async fn assembled_source_is_complete_and_deterministic() {
    let (store, _alice, target_id) = calculator_store().await;

    let source = assemble_target(store.as_ref(), &target_id).await.unwrap();

    // Parameter lists come from the stored metadata, not the raw body.
    assert!(source.contains("def addNumbers(a: int, b: int) -> int:"));
    assert!(source.contains("def greeting() -> str:"));
    assert!(source.contains("def explain(topic: str) -> str:"));
    assert!(source.contains("PRECISION = 2"));
    assert!(source.contains("mcp = FastMCP(\"calculator\")"));
    assert!(source.ends_with("mcp.run(transport=\"stdio\")\n"));

    // Resources come before tools, tools before prompts.
    let greeting = source.find("def greeting").unwrap();
    let add = source.find("def addNumbers").unwrap();
    let explain = source.find("def explain").unwrap();
    assert!(greeting < add && add < explain);

    let again = assemble_target(store.as_ref(), &target_id).await.unwrap();
    assert_eq!(source, again);
}

#[tokio::test]
async fn python_source_under_sh_fails_the_crash_window() {
    if !sh_available() {
        eprintln!("skipping: sh not found");
        return;
    }
    let (store, alice, target_id) = calculator_store().await;
    let source = assemble_target(store.as_ref(), &target_id).await.unwrap();

    let root = tempfile::tempdir().unwrap();
    let runtime = sh_runtime(root.path(), store, 2000);

    // sh cannot execute Python, so the worker dies inside the window.
    let outcome = runtime.start(&target_id, &source, &alice).await.unwrap();
    match outcome {
        StartOutcome::SpawnFailed { diagnostics, .. } => {
            assert!(!diagnostics.is_empty(), "crash diagnostics must be captured");
        }
        StartOutcome::Started { .. } => panic!("python source must not run under sh"),
    }
    assert_eq!(runtime.status(&target_id).await, WorkerState::Failed);

    // A failed target may be started again.
    let outcome = runtime.start(&target_id, "sleep 30\n", &alice).await.unwrap();
    assert!(matches!(outcome, StartOutcome::Started { .. }));
    assert_eq!(runtime.status(&target_id).await, WorkerState::Running);

    let stopped = runtime.stop(&target_id).await.unwrap();
    assert!(matches!(stopped, StopOutcome::Stopped { env_cleaned: true, .. }));
    assert_eq!(runtime.status(&target_id).await, WorkerState::Stopped);
}

/// A fake MCP worker answering the handshake and one request per session.
const FAKE_MCP_WORKER: &str = r#"read line
printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{},"serverInfo":{"name":"calculator","version":"0"}}}'
read line
read line
case "$line" in
  *tools/list*)
    printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"addNumbers","description":"Add two integers"}]}}' ;;
  *tools/call*)
    printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"7"}],"isError":false}}' ;;
  *resources/read*)
    printf '%s\n' '{"jsonrpc":"2.0","id":2,"result":{"contents":[{"uri":"data://greeting","text":"hello"}]}}' ;;
  *)
    printf '%s\n' '{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Method not found"}}' ;;
esac
"#;

#[tokio::test]
async fn bridge_interrogates_an_exported_worker() {
    if !sh_available() {
        eprintln!("skipping: sh not found");
        return;
    }
    let root = tempfile::tempdir().unwrap();
    let layout = WorkspaceLayout::new(root.path());
    tokio::fs::create_dir_all(layout.target_dir("calc")).await.unwrap();
    tokio::fs::write(layout.source_file("calc"), FAKE_MCP_WORKER).await.unwrap();

    let bridge = CapabilityBridge::new(BridgeOptions {
        workers_dir: root.path().to_path_buf(),
        worker_command: vec!["sh".into(), "{file}".into()],
        session_timeout: Duration::from_secs(5),
    });

    // Each call is its own session against a fresh process.
    let tools = bridge.list("calc", FragmentKind::Tool).await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "addNumbers");

    let result = bridge
        .invoke_tool("calc", "addNumbers", json!({"a": 3, "b": 4}))
        .await
        .unwrap();
    assert_eq!(result["content"][0]["text"], "7");

    let resource = bridge.read_resource("calc", "data://greeting").await.unwrap();
    assert_eq!(resource["contents"][0]["text"], "hello");

    // Unexported targets are rejected before any process is spawned.
    assert!(bridge.list("ghost", FragmentKind::Tool).await.is_err());
}
