//! JSON-RPC 2.0 wire model.
//!
//! Outbound requests are built here; inbound payloads are mostly displayed
//! raw by the flows, so the model stays deliberately small.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ClientIdentity;

/// JSON-RPC version string sent with every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision the prober claims during `initialize`.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// A JSON-RPC 2.0 message (request, notification, or response).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Correlation identifier; absent for notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    /// Method name (requests and notifications).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Result payload (responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload (error responses).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcMessage {
    /// Build a request with a correlation id.
    pub fn request(method: &str, id: i64, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(Value::from(id)),
            method: Some(method.to_string()),
            params: Some(params),
            result: None,
            error: None,
        }
    }

    /// Build a notification: no id, no response expected.
    pub fn notification(method: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: Some(method.to_string()),
            params: None,
            result: None,
            error: None,
        }
    }

    /// Standard `initialize` request opening an MCP/A2A session.
    pub fn initialize(id: i64, identity: &ClientIdentity) -> Self {
        Self::request(
            "initialize",
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": identity.name,
                    "version": identity.version,
                },
            }),
        )
    }

    /// `notifications/initialized` acknowledgement sent after `initialize`.
    pub fn initialized_notification() -> Self {
        Self::notification("notifications/initialized")
    }

    /// `tools/list` request with empty params.
    pub fn tools_list(id: i64) -> Self {
        Self::request("tools/list", id, json!({}))
    }

    /// True for messages that carry a method but no correlation id.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.is_some()
    }
}
