//! Tools Module
//!
//! Built-in tool categories. Each category module exports a `register`
//! function that adds its executor to the registry during server
//! initialization. Editor-side categories are registered by the embedding
//! host through [`ToolRegistry::register`].

pub mod server;
pub mod validation;

use crate::mcp::config::Settings;
use crate::mcp::registry::{RegistryError, ToolRegistry};

/// Build a registry holding every built-in category.
pub fn build_registry(settings: &Settings) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    server::register(&mut registry, settings)?;
    validation::register(&mut registry)?;
    Ok(registry)
}
