//! Validation Tools
//!
//! `validation` category: helpers for clients that struggle to produce valid
//! JSON arguments. They check and repair JSON with the same recovery the
//! server applies to request bodies.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::mcp::protocol::{ToolDefinition, ToolResponse};
use crate::mcp::recovery::{self, BodyParseError};
use crate::mcp::registry::{RegistryError, ToolExecutor, ToolRegistry};

pub const CATEGORY: &str = "validation";

/// Register the validation tools with the tool registry.
pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register(CATEGORY, Arc::new(ValidationTools))
}

pub struct ValidationTools;

#[async_trait]
impl ToolExecutor for ValidationTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "validate_json_params",
                "Validate a JSON string and try to repair common mistakes (trailing commas, single quotes, unescaped characters).",
                json!({
                    "type": "object",
                    "properties": {
                        "jsonString": {
                            "type": "string",
                            "description": "JSON text to validate"
                        },
                        "json": {
                            "type": "string",
                            "description": "Alias of jsonString"
                        }
                    },
                    "anyOf": [
                        { "required": ["jsonString"] },
                        { "required": ["json"] }
                    ]
                }),
            ),
            ToolDefinition::new(
                "safe_string_value",
                "Escape a string so it can be embedded in a JSON document.",
                json!({
                    "type": "object",
                    "properties": {
                        "value": {
                            "type": "string",
                            "description": "String to escape"
                        }
                    },
                    "required": ["value"]
                }),
            ),
            ToolDefinition::new(
                "format_mcp_request",
                "Build a well-formed JSON-RPC tools/call request for a tool.",
                json!({
                    "type": "object",
                    "properties": {
                        "toolName": {
                            "type": "string",
                            "description": "Flattened tool name, e.g. node_create_node"
                        },
                        "arguments": {
                            "type": "object",
                            "description": "Tool arguments",
                            "default": {}
                        }
                    },
                    "required": ["toolName"]
                }),
            ),
        ]
    }

    async fn execute(&self, method: &str, args: Value) -> anyhow::Result<ToolResponse> {
        match method {
            "validate_json_params" => {
                let text = string_arg(&args, "jsonString")
                    .or_else(|_| string_arg(&args, "json"))
                    .map_err(|_| anyhow!("Missing required parameter: jsonString"))?;
                Ok(validate_json(text))
            }
            "safe_string_value" => {
                let value = string_arg(&args, "value")?;
                Ok(ToolResponse::ok(json!({
                    "original": value,
                    "escaped": serde_json::to_string(value)?
                })))
            }
            "format_mcp_request" => {
                let tool_name = string_arg(&args, "toolName")?;
                let arguments = args.get("arguments").cloned().unwrap_or_else(|| json!({}));
                let request = json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "method": "tools/call",
                    "params": {
                        "name": tool_name,
                        "arguments": arguments
                    }
                });
                Ok(ToolResponse::ok(json!({
                    "request": request,
                    "body": serde_json::to_string(&request)?
                })))
            }
            other => bail!("Unknown tool: {other}"),
        }
    }
}

fn string_arg<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("Missing required parameter: {key}"))
}

fn validate_json(text: &str) -> ToolResponse {
    let strict_error = match serde_json::from_str::<Value>(text) {
        Ok(parsed) => return ToolResponse::ok(json!({ "valid": true, "parsed": parsed })),
        Err(err) => err,
    };

    match recovery::attempt_recover(text) {
        Some(fixed) => {
            let parsed: Value = serde_json::from_str(&fixed).unwrap_or(Value::Null);
            ToolResponse::ok(json!({
                "valid": false,
                "recovered": true,
                "fixed": fixed,
                "parsed": parsed
            }))
            .with_message("JSON was repaired; check the fixed text before reuse")
        }
        None => ToolResponse::failure(BodyParseError::new(&strict_error, text).to_string()),
    }
}
