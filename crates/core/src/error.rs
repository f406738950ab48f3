//! Error types for the CapForge domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all CapForge operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Assembly errors ---
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    // --- Runtime errors ---
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    // --- Bridge errors ---
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum AssemblyError {
    /// The fragment's stored body has no discoverable top-level function
    /// header, so its parameter list cannot be rewritten.
    #[error("Malformed fragment {fragment_id}: no top-level function header found")]
    MalformedFragment { fragment_id: String },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Start was requested for a target that is already starting or running.
    #[error("Target {target_id} is already active ({state})")]
    AlreadyActive { target_id: String, state: String },

    /// Dependency provisioning failed before the worker was spawned.
    #[error("Provisioning failed for {package}: {reason}")]
    Provision { package: String, reason: String },

    /// The worker process could not be launched at the OS level.
    #[error("Failed to spawn worker for {target_id}: {reason}")]
    Spawn { target_id: String, reason: String },

    /// Working directory materialization failed.
    #[error("Workspace error for {target_id}: {reason}")]
    Workspace { target_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum BridgeError {
    /// The generated worker source does not exist on disk.
    #[error("Worker for {target_id} has not been exported")]
    WorkerNotExported { target_id: String },

    /// Protocol-level failure: handshake, list, or invocation.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// The requested kind does not support the requested operation.
    #[error("Invalid capability kind for this operation: {0}")]
    InvalidKind(String),
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
