//! Name-keyed catalogue of registered tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tool::{DynTool, Tool};

/// Errors from tool registration.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A tool with this name is already registered.
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
}

/// Read-mostly catalogue of tool descriptors.
///
/// All tools are registered during startup, before any execution begins;
/// after that the registry is only read. Lookups take `&self`, so a shared
/// registry (`Arc<ToolRegistry>`) is safe for any number of concurrent
/// pipeline calls.
///
/// # Example
///
/// ```rust
/// use warden_core::{ToolRegistry, box_tools};
/// # use warden_core::{ExecutionContext, Tool, ToolError, ToolKind, ToolOutput};
/// # use schemars::JsonSchema;
/// # use serde::Deserialize;
/// # #[derive(Deserialize, JsonSchema)]
/// # struct EchoInput { message: String }
/// # struct EchoTool;
/// # impl Tool for EchoTool {
/// #     type Input = EchoInput;
/// #     fn name(&self) -> &str { "echo" }
/// #     fn description(&self) -> &str { "Echo" }
/// #     fn kind(&self) -> ToolKind { ToolKind::ReadOnly }
/// #     async fn execute(&self, input: Self::Input, _ctx: &ExecutionContext)
/// #         -> Result<ToolOutput, ToolError> { Ok(input.message.into()) }
/// # }
///
/// let mut registry = ToolRegistry::new();
/// registry.register(EchoTool).unwrap();
/// assert!(registry.get("echo").is_some());
/// assert!(registry.register(EchoTool).is_err());
/// ```
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn DynTool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool.
    ///
    /// Fails with [`RegistryError::Duplicate`] if the name is already taken;
    /// the existing registration is left untouched.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<(), RegistryError> {
        self.register_boxed(crate::tool::box_tool(tool))
    }

    /// Register an already-boxed tool.
    pub fn register_boxed(&mut self, tool: Box<dyn DynTool>) -> Result<(), RegistryError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.tools.insert(name, Arc::from(tool));
        Ok(())
    }

    /// Register a batch of boxed tools, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        tools: impl IntoIterator<Item = Box<dyn DynTool>>,
    ) -> Result<(), RegistryError> {
        for tool in tools {
            self.register_boxed(tool)?;
        }
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn DynTool>> {
        self.tools.get(name).cloned()
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Iterate over all registered tools.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DynTool>> {
        self.tools.values()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
