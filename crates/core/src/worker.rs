//! Worker process records — one per build target.
//!
//! Lifecycle: `stopped -> starting -> {running | failed}`. An absent record
//! means stopped. `running`/`starting` imply a live process handle is
//! recorded; `stopped`/`failed` imply no handle may be acted on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::target::TargetId;

/// Supervision state of a build target's worker process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Stopped,
    Starting,
    Running,
    Failed,
}

impl WorkerState {
    /// Whether a new spawn may be attempted from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, WorkerState::Stopped | WorkerState::Failed)
    }

    /// Whether this state implies a live process handle.
    pub fn is_active(&self) -> bool {
        matches!(self, WorkerState::Starting | WorkerState::Running)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Starting => "starting",
            WorkerState::Running => "running",
            WorkerState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// The status row persisted per build target. At most one per target id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub target_id: TargetId,

    pub state: WorkerState,

    /// Opaque process handle (PID). Only meaningful while `state.is_active()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl WorkerRecord {
    pub fn new(target_id: &str) -> Self {
        let now = Utc::now();
        Self {
            target_id: target_id.into(),
            state: WorkerState::Stopped,
            pid: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new state, recording the handle and timestamp.
    pub fn transition(&mut self, state: WorkerState, pid: Option<u32>) {
        self.state = state;
        self.pid = pid;
        self.updated_at = Utc::now();
    }
}
