//! Loading tool schemas and reconciling them after a definition change.

use std::sync::Arc;

use tracing::{debug, info};

use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::gateway::{GatewayToolDefinitionUpdates, GatewayToolHandlerRegistry};
use crate::request::AgentExecutionContext;
use crate::types::ToolDefinition;

use super::{AdHocToolsSchema, AdHocToolsSchemaResolver};

/// Resolves the tools available to an agent.
#[derive(Clone)]
pub struct AgentToolsResolver {
    schema_resolver: Arc<dyn AdHocToolsSchemaResolver>,
    gateways: Arc<GatewayToolHandlerRegistry>,
}

impl std::fmt::Debug for AgentToolsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentToolsResolver")
            .field("gateways", &self.gateways)
            .finish_non_exhaustive()
    }
}

impl AgentToolsResolver {
    pub fn new(
        schema_resolver: Arc<dyn AdHocToolsSchemaResolver>,
        gateways: Arc<GatewayToolHandlerRegistry>,
    ) -> Self {
        Self {
            schema_resolver,
            gateways,
        }
    }

    /// Schema of the request's tool container; empty when no container is configured.
    pub async fn load_ad_hoc_tools_schema(&self, execution: &AgentExecutionContext) -> Result<AdHocToolsSchema> {
        match execution.container_element_id() {
            Some(container) => {
                debug!(container = %container, "resolving ad-hoc tools schema");
                self.schema_resolver.resolve(container).await
            }
            None => Ok(AdHocToolsSchema::default()),
        }
    }

    /// Reconcile the context's tools with the currently declared schema.
    ///
    /// Existing tools keep their position and pick up changed descriptions or schemas,
    /// new local tools are appended. Removed local tools and any change to the set of
    /// gateways fail the turn.
    pub async fn update_tool_definitions(
        &self,
        execution: &AgentExecutionContext,
        agent_context: AgentContext,
    ) -> Result<AgentContext> {
        let schema = self.load_ad_hoc_tools_schema(execution).await?;

        let gateway_updates = self
            .gateways
            .resolve_updated_gateway_tool_definitions(&agent_context, &schema.gateway_tool_definitions);
        if !gateway_updates.is_empty() {
            return Err(gateway_definitions_changed(&gateway_updates));
        }

        let missing: Vec<&str> = agent_context
            .tool_definitions
            .iter()
            .filter(|existing| !self.gateways.is_gateway_managed(&agent_context, &existing.name))
            .filter(|existing| !schema.tool_definitions.iter().any(|t| t.name == existing.name))
            .map(|existing| existing.name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(AgentError::agent(
                ErrorCode::MigrationMissingTools,
                format!(
                    "The AI Agent references tools that are no longer defined, most likely due to a process migration.\n\
                     Removing or renaming existing tools is currently not supported.\n\
                     Please re-add the following tools to continue agent execution: {}",
                    missing.join(", ")
                ),
            ));
        }

        let mut tool_definitions: Vec<ToolDefinition> = Vec::with_capacity(schema.tool_definitions.len());
        for existing in &agent_context.tool_definitions {
            match schema.tool_definitions.iter().find(|t| t.name == existing.name) {
                Some(declared) => {
                    if declared != existing {
                        info!(tool = %declared.name, "updating changed tool definition");
                    }
                    tool_definitions.push(declared.clone());
                }
                // gateway-managed tools come from discovery, not from the schema
                None => tool_definitions.push(existing.clone()),
            }
        }
        for declared in schema.tool_definitions {
            if !tool_definitions.iter().any(|t| t.name == declared.name) {
                info!(tool = %declared.name, "adding new tool definition");
                tool_definitions.push(declared);
            }
        }

        Ok(agent_context.with_tool_definitions(tool_definitions))
    }
}

fn gateway_definitions_changed(updates: &[(String, GatewayToolDefinitionUpdates)]) -> AgentError {
    let changes = updates
        .iter()
        .map(|(gateway_type, update)| {
            let mut parts = Vec::new();
            if !update.added.is_empty() {
                parts.push(format!("added: {}", update.added.join(", ")));
            }
            if !update.removed.is_empty() {
                parts.push(format!("removed: {}", update.removed.join(", ")));
            }
            format!("{gateway_type} [{}]", parts.join("; "))
        })
        .collect::<Vec<_>>()
        .join(", ");

    AgentError::agent(
        ErrorCode::MigrationGatewayToolDefinitionsChanged,
        format!(
            "Gateway tool definitions have changed, most likely due to a process migration.\n\
             Adding or removing gateway tool definitions to a running AI Agent is currently not supported.\n\
             Please restore gateway tool definitions to the previous state to continue agent execution.\n\
             Changes: {changes}"
        ),
    )
}
