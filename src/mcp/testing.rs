//! Test doubles shared by the registry and handler tests.

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::mcp::protocol::{ToolDefinition, ToolResponse};
use crate::mcp::registry::ToolExecutor;

/// Collaborator that echoes its calls back and records them.
///
/// Calling the method named `fail` returns an error instead.
pub struct StubExecutor {
    tools: Vec<ToolDefinition>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl StubExecutor {
    pub const FAILURE: &'static str = "stub collaborator failure";

    pub fn new(names: &[&str]) -> Self {
        let tools = names
            .iter()
            .map(|name| {
                ToolDefinition::new(
                    *name,
                    format!("stub {name}"),
                    json!({"type": "object", "properties": {"name": {"type": "string"}}}),
                )
            })
            .collect();
        Self {
            tools,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_schema(name: &str, schema: Value) -> Self {
        Self {
            tools: vec![ToolDefinition::new(name, format!("stub {name}"), schema)],
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Response the stub returns for a successful call.
    pub fn reply(method: &str, args: &Value) -> ToolResponse {
        ToolResponse::ok(json!({"method": method, "args": args}))
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ToolExecutor for StubExecutor {
    fn tools(&self) -> Vec<ToolDefinition> {
        self.tools.clone()
    }

    async fn execute(&self, method: &str, args: Value) -> anyhow::Result<ToolResponse> {
        self.calls.lock().push((method.to_string(), args.clone()));
        if method == "fail" {
            return Err(anyhow!(Self::FAILURE));
        }
        Ok(Self::reply(method, &args))
    }
}
