//! MCP Dispatch Core
//!
//! - protocol.rs: JSON-RPC 2.0 envelope and tool types
//! - schema.rs: input schema compatibility transform and sample arguments
//! - registry.rs: tool collaborators, registry snapshot and dispatcher
//! - recovery.rs: best-effort repair of malformed JSON bodies
//! - handlers.rs: HTTP endpoints (JSON-RPC, REST facade, introspection)
//! - server.rs: loopback HTTP server lifecycle
//! - config.rs: settings file and environment overrides

pub mod config;
pub mod handlers;
pub mod protocol;
pub mod recovery;
pub mod registry;
pub mod schema;
pub mod server;

#[cfg(test)]
mod testing;
