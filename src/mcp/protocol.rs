//! MCP Protocol Types
//!
//! JSON-RPC 2.0 envelope structures used on the `/mcp` endpoint together with
//! the tool-facing types shared by the registry and every collaborator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// MCP protocol revision advertised in `initialize` responses.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal error; also used for unknown methods and unknown tools.
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// Every field is defaulted so that a request missing `method` still reaches
/// dispatch and is answered with an "Unknown method" error instead of being
/// rejected as unparseable.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MCPRequest {
    /// JSON-RPC version identifier, expected to be "2.0"
    #[serde(default)]
    pub jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    #[serde(default)]
    pub id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    #[serde(default)]
    pub method: String,
    /// Method-specific parameters
    #[serde(default)]
    pub params: Option<Value>,
}

impl MCPRequest {
    /// Notifications carry no id and never receive a JSON-RPC response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }
}

/// JSON-RPC 2.0 response structure.
///
/// Exactly one of `result` and `error` is present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MCPResponse {
    /// JSON-RPC version identifier, always "2.0"
    pub jsonrpc: String,
    /// Request ID from the original request, `null` when it could not be read
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Option<Value>, error: MCPError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32603 for internal error)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
}

impl MCPError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Parameters of a `tools/call` request.
#[derive(Deserialize, Debug, Clone)]
pub struct ToolCallParams {
    /// Flattened tool name (`<category>_<tool>`)
    pub name: String,
    /// Tool arguments; absent or `null` means an empty object
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Tool definition as produced by a collaborator.
///
/// `name` is only unique inside the collaborator's category; the registry
/// prefixes it with the category to build the public name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the tool's arguments
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Result of a collaborator call.
///
/// The core never looks inside `data`; the whole structure is serialized into
/// a single MCP text content block.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ToolResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}
