//! Capability Bridge — live interrogation of exported workers over MCP stdio.
//!
//! Each bridge call spawns the target's worker fresh, performs the MCP
//! handshake, runs exactly one operation, and tears the process down. No
//! session state survives a call; nothing here touches the orchestrator's
//! supervised processes.

pub mod bridge;
pub mod rpc;
pub mod session;

pub use bridge::{BridgeOptions, CapabilityBridge};
pub use rpc::{RpcError, RpcNotification, RpcRequest, RpcResponse};
pub use session::WorkerSession;
