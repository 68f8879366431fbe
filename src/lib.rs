//! MCP server core for exposing editor tool collaborators over HTTP/JSON-RPC.
//!
//! Collaborators implement [`ToolExecutor`] and are registered under a
//! category in a [`ToolRegistry`]; [`McpServer`] serves the registry on
//! loopback.

pub mod mcp;
pub mod tools;

pub use mcp::config::Settings;
pub use mcp::protocol::{ToolDefinition, ToolResponse};
pub use mcp::registry::{EnabledTool, ToolExecutor, ToolRegistry};
pub use mcp::server::{McpServer, ServerStatus};
