//! Tool Registry
//!
//! Collaborators register under a category key. Their tools are flattened into
//! one namespace (`<category>_<tool>`) and published as an immutable snapshot
//! that is replaced wholesale whenever the registry rebuilds. Routing uses the
//! `(category, method)` pair recorded at rebuild time, so names are never
//! split again at call time.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::mcp::protocol::{ToolDefinition, ToolResponse};
use crate::mcp::schema::transform_schema;

/// A category-scoped tool provider.
///
/// Implementations list their tools with unprefixed names and execute them by
/// that same unprefixed name. Any error returned from `execute` is passed to
/// the caller as-is.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tool definitions currently offered by this collaborator
    fn tools(&self) -> Vec<ToolDefinition>;

    /// Execute `method` with the caller's arguments
    async fn execute(&self, method: &str, args: Value) -> anyhow::Result<ToolResponse>;
}

/// One entry of the enabled-tool filter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnabledTool {
    pub category: String,
    pub name: String,
}

impl EnabledTool {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    pub fn flattened_name(&self) -> String {
        flattened_name(&self.category, &self.name)
    }
}

/// A tool as published to clients.
///
/// Serializes to the MCP `tools/list` shape; `category` and `method` stay
/// internal.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ToolRegistryEntry {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
    #[serde(skip)]
    pub category: String,
    #[serde(skip)]
    pub method: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool category must not be empty")]
    EmptyCategory,
    #[error("tool category {0} is already registered")]
    DuplicateCategory(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Tool {0} not found")]
    NotFound(String),
    /// Error raised by the collaborator itself, message kept verbatim
    #[error("{0}")]
    Tool(String),
}

#[derive(Debug, Clone)]
struct Route {
    category: String,
    method: String,
}

#[derive(Debug, Default)]
struct Snapshot {
    tools: Vec<ToolRegistryEntry>,
    routes: HashMap<String, Route>,
}

/// Public name of a tool: category and tool name joined by `_`.
pub fn flattened_name(category: &str, name: &str) -> String {
    format!("{category}_{name}")
}

/// Registry of tool collaborators and the current published tool list.
pub struct ToolRegistry {
    executors: IndexMap<String, Arc<dyn ToolExecutor>>,
    enabled: RwLock<Vec<EnabledTool>>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create an empty, unfiltered registry.
    pub fn new() -> Self {
        Self {
            executors: IndexMap::new(),
            enabled: RwLock::new(Vec::new()),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
        }
    }

    /// Register a collaborator under `category` and rebuild.
    ///
    /// A category can only be registered once; the earlier collaborator stays
    /// in place and the duplicate is reported as an error.
    ///
    /// # Arguments
    /// * `category` - Category key, used as the tool name prefix
    /// * `executor` - Collaborator serving every tool in that category
    pub fn register(
        &mut self,
        category: impl Into<String>,
        executor: Arc<dyn ToolExecutor>,
    ) -> Result<(), RegistryError> {
        let category = category.into();
        if category.is_empty() {
            return Err(RegistryError::EmptyCategory);
        }
        if self.executors.contains_key(&category) {
            return Err(RegistryError::DuplicateCategory(category));
        }

        tracing::debug!(%category, "registering tool category");
        self.executors.insert(category, executor);
        self.rebuild();
        Ok(())
    }

    /// Registered categories in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.executors.keys().map(String::as_str)
    }

    /// Re-read every collaborator's tools and publish a new snapshot.
    ///
    /// Collaborators are visited in registration order. When the filter is
    /// non-empty only matching tools are published, but every tool stays
    /// routable. A flattened name that was already produced during this
    /// rebuild is skipped.
    pub fn rebuild(&self) {
        // Held until the snapshot is stored; filter writers wait for us.
        let enabled = self.enabled.read();
        let filter: HashSet<String> = enabled.iter().map(EnabledTool::flattened_name).collect();

        let mut tools = Vec::new();
        let mut routes = HashMap::new();
        for (category, executor) in &self.executors {
            for definition in executor.tools() {
                let name = flattened_name(category, &definition.name);
                if routes.contains_key(&name) {
                    tracing::warn!(tool = %name, "duplicate tool name, keeping the first registration");
                    continue;
                }
                routes.insert(
                    name.clone(),
                    Route {
                        category: category.clone(),
                        method: definition.name.clone(),
                    },
                );

                if filter.is_empty() || filter.contains(&name) {
                    tools.push(ToolRegistryEntry {
                        name,
                        description: definition.description,
                        input_schema: transform_schema(definition.input_schema),
                        category: category.clone(),
                        method: definition.name,
                    });
                }
            }
        }

        tracing::debug!(published = tools.len(), routable = routes.len(), "tool registry rebuilt");
        *self.snapshot.write() = Arc::new(Snapshot { tools, routes });
        drop(enabled);
    }

    /// Replace the enabled-tool filter and rebuild before returning.
    ///
    /// An empty filter publishes every tool.
    pub fn update_filter(&self, filter: Vec<EnabledTool>) {
        tracing::info!(enabled = filter.len(), "updating enabled tool filter");
        *self.enabled.write() = filter;
        self.rebuild();
    }

    /// Current enabled-tool filter.
    pub fn filter(&self) -> Vec<EnabledTool> {
        self.enabled.read().clone()
    }

    /// Currently published tools.
    pub fn list(&self) -> Vec<ToolRegistryEntry> {
        self.current().tools.clone()
    }

    /// Number of currently published tools.
    pub fn len(&self) -> usize {
        self.current().tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subset of the current list matching `candidate`, without touching the
    /// registry. An empty candidate returns the whole current list.
    pub fn filter_for(&self, candidate: &[EnabledTool]) -> Vec<ToolRegistryEntry> {
        let wanted: HashSet<String> = candidate.iter().map(EnabledTool::flattened_name).collect();
        self.current()
            .tools
            .iter()
            .filter(|tool| wanted.is_empty() || wanted.contains(&tool.name))
            .cloned()
            .collect()
    }

    /// Execute a tool by its flattened name.
    ///
    /// The collaborator's response is returned unchanged, whether it reports
    /// success or failure. Only an unknown name or an error raised by the
    /// collaborator produce a `DispatchError`.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<ToolResponse, DispatchError> {
        let (executor, method) = self
            .resolve(name, |_| true)
            .ok_or_else(|| DispatchError::NotFound(name.to_string()))?;
        Self::invoke(name, executor, &method, args).await
    }

    /// Execute a tool addressed by its category and unprefixed name.
    pub async fn dispatch_parts(
        &self,
        category: &str,
        method: &str,
        args: Value,
    ) -> Result<ToolResponse, DispatchError> {
        let name = flattened_name(category, method);
        let (executor, method) = self
            .resolve(&name, |route| route.category == category && route.method == method)
            .ok_or_else(|| DispatchError::NotFound(name.clone()))?;
        Self::invoke(&name, executor, &method, args).await
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshot.read())
    }

    fn resolve(
        &self,
        name: &str,
        accept: impl Fn(&Route) -> bool,
    ) -> Option<(Arc<dyn ToolExecutor>, String)> {
        let snapshot = self.current();
        let route = snapshot.routes.get(name).filter(|&route| accept(route))?;
        let executor = self.executors.get(&route.category)?;
        Some((Arc::clone(executor), route.method.clone()))
    }

    async fn invoke(
        name: &str,
        executor: Arc<dyn ToolExecutor>,
        method: &str,
        args: Value,
    ) -> Result<ToolResponse, DispatchError> {
        tracing::debug!(tool = %name, "dispatching tool call");
        executor.execute(method, args).await.map_err(|err| {
            tracing::warn!(tool = %name, error = %err, "tool execution failed");
            DispatchError::Tool(err.to_string())
        })
    }
}
