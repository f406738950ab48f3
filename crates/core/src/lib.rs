//! # CapForge Core
//!
//! Domain types, traits, and error definitions for the CapForge capability
//! workbench. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Collaborators (the fragment store, the dependency provisioner) are defined
//! as traits here. Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod fragment;
pub mod identity;
pub mod store;
pub mod target;
pub mod worker;
pub mod workspace;

// Re-export key types at crate root for ergonomics
pub use error::{AssemblyError, BridgeError, Error, Result, RuntimeError, StoreError};
pub use fragment::{Fragment, FragmentId, FragmentKind, Param};
pub use identity::Identity;
pub use store::{FragmentStore, Provisioner};
pub use target::{BuildTarget, TargetId};
pub use worker::{WorkerRecord, WorkerState};
pub use workspace::WorkspaceLayout;
