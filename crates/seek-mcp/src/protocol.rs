//! JSON-RPC 2.0 envelopes and the MCP handshake payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const JSONRPC_VERSION: &str = "2.0";
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "mcp-just-seek-knowledge";

/// An incoming message. Requests carry an `id`; notifications do not.
///
/// Every field is optional so malformed messages can still be answered with
/// an `Invalid Request` error that echoes whatever `id` they had.
#[derive(Debug, Clone, Deserialize)]
pub struct Incoming {
  #[serde(default)]
  pub jsonrpc: Option<String>,
  #[serde(default)]
  pub id:      Option<Value>,
  #[serde(default)]
  pub method:  Option<String>,
  #[serde(default)]
  pub params:  Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
  pub jsonrpc: String,
  /// `null` only when the request id could not be determined.
  pub id:      Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub result:  Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<RpcError>,
}

impl Response {
  pub fn success(id: Value, result: Value) -> Self {
    Self { jsonrpc: JSONRPC_VERSION.to_owned(), id, result: Some(result), error: None }
  }

  pub fn failure(id: Value, error: RpcError) -> Self {
    Self { jsonrpc: JSONRPC_VERSION.to_owned(), id, result: None, error: Some(error) }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
  pub code:    i64,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<Value>,
}

impl RpcError {
  pub const PARSE_ERROR: i64 = -32700;
  pub const INVALID_REQUEST: i64 = -32600;
  pub const METHOD_NOT_FOUND: i64 = -32601;
  pub const INVALID_PARAMS: i64 = -32602;
  pub const INTERNAL_ERROR: i64 = -32603;

  // Server-defined range.
  pub const ALREADY_EXISTS: i64 = -32001;
  pub const NOT_FOUND: i64 = -32002;
  pub const CONFLICT: i64 = -32003;
  pub const STORAGE_UNAVAILABLE: i64 = -32004;
  pub const EMBEDDING_FAILED: i64 = -32005;

  pub fn new(code: i64, message: impl Into<String>) -> Self {
    Self { code, message: message.into(), data: None }
  }

  pub fn with_data(mut self, data: Value) -> Self {
    self.data = Some(data);
    self
  }
}

// ─── MCP payloads ────────────────────────────────────────────────────────────

/// Result of `initialize`.
pub fn initialize_result() -> Value {
  json!({
    "protocolVersion": MCP_PROTOCOL_VERSION,
    "capabilities": { "tools": {} },
    "serverInfo": {
      "name": SERVER_NAME,
      "version": env!("CARGO_PKG_VERSION"),
    },
  })
}

/// Parameters of `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
  pub name:      String,
  #[serde(default)]
  pub arguments: Option<Value>,
}

/// Wrap a tool's output as a single text content block.
pub fn text_content(text: String) -> Value {
  json!({ "content": [{ "type": "text", "text": text }] })
}
