//! Lifecycle Orchestrator — spawns, supervises, and tears down worker
//! processes, one per build target.
//!
//! Each target's worker is an independent OS process. The orchestrator owns
//! a process-wide registry of per-target slots; transitions on one slot are
//! serialized by a per-id mutex and never block other targets.

pub mod orchestrator;
pub mod provision;
pub mod workdir;

pub use orchestrator::{
    LifecycleOrchestrator, RuntimeOptions, StartOutcome, StopOutcome,
};
pub use provision::UvProvisioner;
pub use workdir::Workdir;
