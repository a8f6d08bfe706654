//! Tool schemas declared by the caller and their reconciliation with a running conversation.

pub mod resolver;

pub use resolver::AgentToolsResolver;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::gateway::GatewayToolDefinition;
use crate::types::ToolDefinition;

/// Tools declared inside a tool container, split into local tools and gateways.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdHocToolsSchema {
    #[serde(default)]
    pub tool_definitions: Vec<ToolDefinition>,
    #[serde(default)]
    pub gateway_tool_definitions: Vec<GatewayToolDefinition>,
}

impl AdHocToolsSchema {
    pub fn new(
        tool_definitions: Vec<ToolDefinition>,
        gateway_tool_definitions: Vec<GatewayToolDefinition>,
    ) -> Self {
        Self {
            tool_definitions,
            gateway_tool_definitions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tool_definitions.is_empty() && self.gateway_tool_definitions.is_empty()
    }
}

/// Resolves the tools declared in a container element.
#[async_trait]
pub trait AdHocToolsSchemaResolver: Send + Sync {
    async fn resolve(&self, container_element_id: &str) -> Result<AdHocToolsSchema>;
}

/// Resolver over schemas known up front, e.g. loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticToolsSchemaResolver {
    schemas: HashMap<String, AdHocToolsSchema>,
    fallback: Option<AdHocToolsSchema>,
}

impl StaticToolsSchemaResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, container_element_id: impl Into<String>, schema: AdHocToolsSchema) -> Self {
        self.schemas.insert(container_element_id.into(), schema);
        self
    }

    /// Schema returned for containers without a dedicated entry.
    pub fn for_any_container(schema: AdHocToolsSchema) -> Self {
        Self {
            schemas: HashMap::new(),
            fallback: Some(schema),
        }
    }
}

#[async_trait]
impl AdHocToolsSchemaResolver for StaticToolsSchemaResolver {
    async fn resolve(&self, container_element_id: &str) -> Result<AdHocToolsSchema> {
        self.schemas
            .get(container_element_id)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| {
                AgentError::Configuration(format!(
                    "No tools schema found for container element '{container_element_id}'"
                ))
            })
    }
}
