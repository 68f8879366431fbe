//! Server Configuration
//!
//! Settings come from an optional TOML file (named by `MCP_SETTINGS_FILE`)
//! and are then overridden by environment variables:
//!
//! - SERVER_NAME: Name reported in `initialize` (default: "cocos-mcp-server")
//! - SERVER_VERSION: Version reported in `initialize` (default: crate version)
//! - PORT: Loopback port to bind (default: 3000)
//! - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
//! - MCP_DEBUG: "1"/"true" enables debug logging

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::mcp::registry::EnabledTool;

/// Environment variable naming the settings file.
pub const SETTINGS_FILE_ENV: &str = "MCP_SETTINGS_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_name: String,
    pub server_version: String,
    pub port: u16,
    pub workers: usize,
    /// Maximum concurrent connections per worker
    pub max_connections: usize,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    pub debug_log: bool,
    /// Tools published in `tools/list`; empty publishes everything
    pub enabled_tools: Vec<EnabledTool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: "cocos-mcp-server".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            port: 3000,
            workers: num_cpus::get().clamp(1, 16),
            max_connections: 10_000,
            max_body_bytes: 4 * 1024 * 1024,
            debug_log: false,
            enabled_tools: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from the file named by `MCP_SETTINGS_FILE` (if any) and
    /// the process environment.
    pub fn load() -> Result<Self> {
        let mut settings = match std::env::var(SETTINGS_FILE_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                tracing::debug!("no settings file configured, using defaults");
                Self::default()
            }
        };
        settings.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides read through `lookup` (the process environment in
    /// production).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(name) = lookup("SERVER_NAME") {
            self.server_name = name;
        }
        if let Some(version) = lookup("SERVER_VERSION") {
            self.server_version = version;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.trim().parse().with_context(|| format!("Invalid PORT value: {port}"))?;
        }
        if let Some(workers) = lookup("WORKER_THREADS") {
            let workers: usize = workers
                .trim()
                .parse()
                .with_context(|| format!("Invalid WORKER_THREADS value: {workers}"))?;
            self.workers = workers.max(1);
        }
        if let Some(debug) = lookup("MCP_DEBUG") {
            self.debug_log = matches!(debug.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        Ok(())
    }
}
