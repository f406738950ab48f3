//! The per-target state machine: `stopped -> starting -> {running | failed}`,
//! `running -> stopped` on explicit stop, `failed -> stopped` via cleanup.
//!
//! Every transition for one target id happens under that id's own mutex, so
//! two concurrent `start` calls can never both pass the state guard; targets
//! never contend with each other.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use capforge_core::error::{Result, RuntimeError};
use capforge_core::identity::Identity;
use capforge_core::store::{FragmentStore, Provisioner};
use capforge_core::target::TargetId;
use capforge_core::worker::{WorkerRecord, WorkerState};

use crate::workdir::Workdir;

/// Orchestrator tuning knobs.
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Root directory for per-target worker directories.
    pub workers_dir: PathBuf,

    /// Command template launching a worker; `{file}` is replaced with the
    /// generated source file name and the command runs inside the target
    /// directory.
    pub worker_command: Vec<String>,

    /// How long to watch a fresh spawn for an immediate crash.
    pub crash_window: Duration,

    /// Packages installed into every worker environment before the caller's
    /// own packages.
    pub bootstrap_packages: Vec<String>,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            workers_dir: PathBuf::from("workers"),
            worker_command: vec!["uv".into(), "run".into(), "{file}".into()],
            crash_window: Duration::from_secs(5),
            bootstrap_packages: vec!["mcp".into()],
        }
    }
}

/// Result of a start request that made it to the spawn stage.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StartOutcome {
    /// The worker survived the crash window and is running.
    Started { pid: u32 },

    /// The worker launched but exited inside the crash window. A clean exit
    /// before the window closes never counts as running.
    SpawnFailed {
        exit_code: Option<i32>,
        diagnostics: String,
    },
}

/// Result of a stop request. Stopping is idempotent.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopOutcome {
    /// Nothing to do: no record, or the worker was already inactive.
    AlreadyInactive { state: WorkerState },

    /// The worker was signaled, the record cleared, and the directory
    /// removed (best-effort).
    Stopped { pid: Option<u32>, env_cleaned: bool },
}

/// One registry slot per target: the status record plus the live child
/// handle while the worker is active.
struct WorkerSlot {
    record: WorkerRecord,
    child: Option<Child>,
}

/// Owns the build-target id -> worker registry and all process lifecycle
/// transitions.
pub struct LifecycleOrchestrator {
    options: RuntimeOptions,
    workdir: Workdir,
    store: Arc<dyn FragmentStore>,
    provisioner: Arc<dyn Provisioner>,
    slots: RwLock<HashMap<TargetId, Arc<Mutex<WorkerSlot>>>>,
}

impl LifecycleOrchestrator {
    pub fn new(
        options: RuntimeOptions,
        store: Arc<dyn FragmentStore>,
        provisioner: Arc<dyn Provisioner>,
    ) -> Self {
        let workdir = Workdir::new(options.workers_dir.clone());
        Self {
            options,
            workdir,
            store,
            provisioner,
            slots: RwLock::new(HashMap::new()),
        }
    }

    pub fn workdir(&self) -> &Workdir {
        &self.workdir
    }

    /// Start the target's worker from the given assembled source.
    ///
    /// Requires the current state to be stopped or failed. Provisioning or
    /// spawn failures abort before any process outlives the call and leave
    /// the state at stopped; a launch that dies inside the crash window is
    /// reported as `SpawnFailed` with the captured diagnostics.
    pub async fn start(
        &self,
        target_id: &str,
        source: &str,
        identity: &Identity,
    ) -> Result<StartOutcome> {
        let slot = self.slot(target_id).await;
        let mut slot = slot.lock().await;

        if !slot.record.state.can_start() {
            return Err(RuntimeError::AlreadyActive {
                target_id: target_id.to_string(),
                state: slot.record.state.to_string(),
            }
            .into());
        }

        let dir = self.workdir.materialize(target_id, source).await?;
        slot.record.transition(WorkerState::Starting, None);

        if let Err(e) = self.provision(&dir, identity).await {
            slot.record.transition(WorkerState::Stopped, None);
            self.workdir.remove(target_id).await;
            return Err(e);
        }

        let mut child = match self.spawn(target_id, &dir) {
            Ok(child) => child,
            Err(e) => {
                slot.record.transition(WorkerState::Stopped, None);
                self.workdir.remove(target_id).await;
                return Err(e.into());
            }
        };
        let pid = child.id();
        slot.record.transition(WorkerState::Starting, pid);
        debug!(target_id = %target_id, pid = ?pid, "Worker spawned, watching crash window");

        // Drain stdio concurrently so a chatty worker can't fill its pipes
        // and stall inside the window.
        let stdout_task = tokio::spawn(capture(child.stdout.take()));
        let stderr_task = tokio::spawn(capture(child.stderr.take()));

        match tokio::time::timeout(self.options.crash_window, child.wait()).await {
            // Exited inside the window: failed, whatever the exit code.
            Ok(wait_result) => {
                let exit_code = match wait_result {
                    Ok(status) => status.code(),
                    Err(_) => None,
                };
                let stdout = stdout_task.await.unwrap_or_default();
                let stderr = stderr_task.await.unwrap_or_default();
                let diagnostics = if stderr.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    stderr.trim().to_string()
                };

                slot.record.transition(WorkerState::Failed, pid);
                self.workdir.remove(target_id).await;
                warn!(
                    target_id = %target_id,
                    exit_code = ?exit_code,
                    "Worker exited inside the crash window"
                );
                Ok(StartOutcome::SpawnFailed { exit_code, diagnostics })
            }
            // Window elapsed with the process alive: running.
            Err(_elapsed) => {
                slot.record.transition(WorkerState::Running, pid);
                slot.child = Some(child);
                info!(target_id = %target_id, pid = ?pid, "Worker running");
                Ok(StartOutcome::Started { pid: pid.unwrap_or_default() })
            }
        }
    }

    /// Stop the target's worker. Idempotent: an absent or inactive record is
    /// reported as already inactive with no side effects. Termination is a
    /// best-effort signal; the directory is removed regardless.
    pub async fn stop(&self, target_id: &str) -> Result<StopOutcome> {
        let Some(slot) = self.existing_slot(target_id).await else {
            return Ok(StopOutcome::AlreadyInactive { state: WorkerState::Stopped });
        };
        let mut slot = slot.lock().await;

        if !slot.record.state.is_active() {
            return Ok(StopOutcome::AlreadyInactive { state: slot.record.state });
        }

        let pid = slot.record.pid;
        if let Some(mut child) = slot.child.take() {
            // Fire-and-forget: a process that already exited is not an error.
            match child.start_kill() {
                Ok(()) => debug!(target_id = %target_id, pid = ?pid, "Termination signal sent"),
                Err(e) => debug!(target_id = %target_id, error = %e, "Worker already gone"),
            }
        }

        slot.record.transition(WorkerState::Stopped, None);
        let env_cleaned = self.workdir.remove(target_id).await;
        info!(target_id = %target_id, env_cleaned, "Worker stopped");
        Ok(StopOutcome::Stopped { pid, env_cleaned })
    }

    /// Current state of one target. An absent record reads as stopped.
    pub async fn status(&self, target_id: &str) -> WorkerState {
        match self.existing_slot(target_id).await {
            Some(slot) => slot.lock().await.record.state,
            None => WorkerState::Stopped,
        }
    }

    /// Snapshot of every known worker record.
    pub async fn records(&self) -> Vec<WorkerRecord> {
        let slots: Vec<Arc<Mutex<WorkerSlot>>> =
            self.slots.read().await.values().cloned().collect();
        let mut records = Vec::with_capacity(slots.len());
        for slot in slots {
            records.push(slot.lock().await.record.clone());
        }
        records
    }

    async fn provision(&self, dir: &Path, identity: &Identity) -> Result<()> {
        for package in &self.options.bootstrap_packages {
            self.provisioner.ensure(dir, package).await?;
        }
        for package in self.store.installed_packages(&identity.username).await? {
            self.provisioner.ensure(dir, &package).await?;
        }
        Ok(())
    }

    fn spawn(&self, target_id: &str, dir: &Path) -> std::result::Result<Child, RuntimeError> {
        let file = self.workdir.layout().source_file_name(target_id);
        let argv: Vec<String> = self
            .options
            .worker_command
            .iter()
            .map(|part| part.replace("{file}", &file))
            .collect();
        let (program, args) = argv.split_first().ok_or_else(|| RuntimeError::Spawn {
            target_id: target_id.to_string(),
            reason: "empty worker command".into(),
        })?;

        Command::new(program)
            .args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RuntimeError::Spawn {
                target_id: target_id.to_string(),
                reason: e.to_string(),
            })
    }

    /// Get or create the per-target slot.
    async fn slot(&self, target_id: &str) -> Arc<Mutex<WorkerSlot>> {
        if let Some(slot) = self.existing_slot(target_id).await {
            return slot;
        }
        let mut slots = self.slots.write().await;
        slots
            .entry(target_id.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(WorkerSlot {
                    record: WorkerRecord::new(target_id),
                    child: None,
                }))
            })
            .clone()
    }

    async fn existing_slot(&self, target_id: &str) -> Option<Arc<Mutex<WorkerSlot>>> {
        self.slots.read().await.get(target_id).cloned()
    }
}

/// Read a captured stdio stream to the end.
async fn capture<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf).await;
    String::from_utf8_lossy(&buf).into_owned()
}
