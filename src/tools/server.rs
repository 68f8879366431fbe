//! Server Tools
//!
//! `server` category: information about the running MCP server process.

use std::sync::Arc;
use std::time::Instant;

use anyhow::bail;
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::mcp::config::Settings;
use crate::mcp::protocol::{ToolDefinition, ToolResponse};
use crate::mcp::registry::{RegistryError, ToolExecutor, ToolRegistry};

pub const CATEGORY: &str = "server";

/// Register the server tools with the tool registry.
///
/// # Arguments
/// * `registry` - Registry the `server` category is added to
/// * `settings` - Settings providing the reported server name and version
pub fn register(registry: &mut ToolRegistry, settings: &Settings) -> Result<(), RegistryError> {
    registry.register(CATEGORY, Arc::new(ServerTools::new(settings)))
}

pub struct ServerTools {
    name: String,
    version: String,
    started: Instant,
}

impl ServerTools {
    pub fn new(settings: &Settings) -> Self {
        Self {
            name: settings.server_name.clone(),
            version: settings.server_version.clone(),
            started: Instant::now(),
        }
    }

    fn server_info(&self) -> Value {
        json!({
            "name": self.name,
            "version": self.version,
            "pid": std::process::id(),
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
            "uptimeSeconds": self.started.elapsed().as_secs()
        })
    }
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

#[async_trait]
impl ToolExecutor for ServerTools {
    fn tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new(
                "get_server_info",
                "Get name, version, process and uptime information of the MCP server.",
                no_arguments(),
            ),
            ToolDefinition::new(
                "check_server_status",
                "Check that the MCP server is responsive.",
                no_arguments(),
            ),
        ]
    }

    async fn execute(&self, method: &str, _args: Value) -> anyhow::Result<ToolResponse> {
        match method {
            "get_server_info" => Ok(ToolResponse::ok(self.server_info())),
            "check_server_status" => Ok(ToolResponse::ok(json!({
                "status": "ok",
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
            .with_message("MCP server is running")),
            other => bail!("Unknown tool: {other}"),
        }
    }
}
