use std::fmt;
use std::sync::Arc;

use serde_json::Value as J;

use crate::core::error::RegistryError;
use crate::core::schema::ParamSchema;
use crate::core::tool::{ToolArgs, ToolHandler, ToolResult};

pub const DEFAULT_CAPACITY: usize = 32;

/// A registered tool. Immutable once it is in the registry.
#[derive(Clone)]
pub struct ToolEntry {
    name: String,
    description: Option<String>,
    handler: Arc<dyn ToolHandler>,
    parameters: Vec<ParamSchema>,
}

impl ToolEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> &[ParamSchema] {
        &self.parameters
    }

    pub fn invoke(&self, arguments: Option<&J>) -> ToolResult {
        self.handler.call(&ToolArgs::new(arguments))
    }
}

impl fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters.len())
            .finish()
    }
}

/// Declarative form of a tool, for registering several at once.
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub handler: Arc<dyn ToolHandler>,
    pub parameters: Vec<ParamSchema>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, handler: impl ToolHandler + 'static) -> Self {
        Self {
            name: name.into(),
            description: None,
            handler: Arc::new(handler),
            parameters: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn param(mut self, param: ParamSchema) -> Self {
        self.parameters.push(param);
        self
    }
}

/// Ordered, name-unique tool collection with a fixed upper bound.
///
/// Lookups are a linear scan; registries hold tens of entries.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
    capacity: usize,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { tools: Vec::new(), capacity }
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        description: Option<String>,
        handler: impl ToolHandler + 'static,
        parameters: Vec<ParamSchema>,
    ) -> Result<(), RegistryError> {
        self.push(ToolEntry {
            name: name.into(),
            description,
            handler: Arc::new(handler),
            parameters,
        })
    }

    pub fn register(&mut self, def: ToolDefinition) -> Result<(), RegistryError> {
        self.push(ToolEntry {
            name: def.name,
            description: def.description,
            handler: def.handler,
            parameters: def.parameters,
        })
    }

    fn push(&mut self, entry: ToolEntry) -> Result<(), RegistryError> {
        if entry.name.is_empty() {
            return Err(RegistryError::InvalidArgument("tool name must not be empty"));
        }
        if self.contains(&entry.name) {
            tracing::error!(tool = %entry.name, "tool already registered");
            return Err(RegistryError::DuplicateName(entry.name));
        }
        if self.tools.len() >= self.capacity {
            tracing::error!(capacity = self.capacity, "maximum number of tools reached");
            return Err(RegistryError::CapacityExceeded(self.capacity));
        }
        tracing::info!(tool = %entry.name, "registered tool");
        self.tools.push(entry);
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<&ToolEntry> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Entries in registration order.
    pub fn list(&self) -> &[ToolEntry] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
