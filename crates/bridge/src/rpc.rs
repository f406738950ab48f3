//! JSON-RPC 2.0 message types for stdio communication with worker processes.
//!
//! Workers speak MCP over stdio: newline-delimited JSON-RPC 2.0, one message
//! per line. The bridge sends requests on the worker's stdin and reads
//! responses from its stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision offered during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request sent to the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Protocol version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier for correlating responses.
    pub id: u64,
    /// Method name (e.g., "initialize", "tools/call").
    pub method: String,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 notification: a request without an id, expecting no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response received from the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Protocol version (always "2.0").
    pub jsonrpc: String,
    /// Matching request identifier. Server-initiated notifications omit it.
    #[serde(default)]
    pub id: Option<u64>,
    /// Successful result (mutually exclusive with `error`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object (mutually exclusive with `result`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

impl RpcNotification {
    pub fn new(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

impl RpcResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_without_empty_params() {
        let req = RpcRequest::new(1, "tools/list", None);
        let wire = serde_json::to_string(&req).unwrap();
        assert_eq!(wire, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
    }

    #[test]
    fn response_roundtrip_with_error() {
        let wire = r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Method not found"}}"#;
        let resp: RpcResponse = serde_json::from_str(wire).unwrap();
        assert!(resp.is_error());
        assert_eq!(resp.id, Some(2));
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[test]
    fn server_notification_has_no_id() {
        let wire = r#"{"jsonrpc":"2.0","method":"notifications/message","params":{"level":"info"}}"#;
        let resp: RpcResponse = serde_json::from_str(wire).unwrap();
        assert_eq!(resp.id, None);
        assert!(!resp.is_error());
    }

    #[test]
    fn notification_omits_id_on_the_wire() {
        let note = RpcNotification::new("notifications/initialized", None);
        let wire = serde_json::to_value(&note).unwrap();
        assert_eq!(wire, json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
    }
}
