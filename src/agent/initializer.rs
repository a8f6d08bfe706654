//! Advancing the agent lifecycle before a turn: tool resolution, gateway discovery, migration.

use std::sync::Arc;

use tracing::{debug, info};

use crate::context::{AgentContext, AgentState};
use crate::error::Result;
use crate::gateway::GatewayToolHandlerRegistry;
use crate::request::AgentExecutionContext;
use crate::tools::AgentToolsResolver;
use crate::types::ToolCallResult;

use super::response::AgentResponse;

/// Outcome of lifecycle initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInitializationResult {
    /// Ready for a model call with these tool call results.
    Ready {
        agent_context: AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    },
    /// Return this response without calling the model (discovery calls pending).
    DirectResponse(AgentResponse),
    /// Discovery results are still incomplete; wait for more input.
    DiscoveryInProgress,
}

#[derive(Debug, Clone)]
pub struct AgentInitializer {
    tools: Arc<AgentToolsResolver>,
    gateways: Arc<GatewayToolHandlerRegistry>,
}

impl AgentInitializer {
    pub fn new(tools: Arc<AgentToolsResolver>, gateways: Arc<GatewayToolHandlerRegistry>) -> Self {
        Self { tools, gateways }
    }

    pub async fn initialize(&self, execution: &AgentExecutionContext) -> Result<AgentInitializationResult> {
        let agent_context = execution.initial_agent_context();
        let tool_call_results = execution.tool_call_results().to_vec();

        match agent_context.state {
            AgentState::Initializing => self.initialize_tools(execution, agent_context, tool_call_results).await,
            AgentState::ToolDiscovery => self.handle_tool_discovery(agent_context, tool_call_results),
            AgentState::Ready | AgentState::WaitingForToolInput => {
                let agent_context = self.migrate_if_needed(execution, agent_context).await?;
                Ok(AgentInitializationResult::Ready {
                    agent_context,
                    tool_call_results,
                })
            }
        }
    }

    async fn initialize_tools(
        &self,
        execution: &AgentExecutionContext,
        agent_context: AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<AgentInitializationResult> {
        let schema = self.tools.load_ad_hoc_tools_schema(execution).await?;
        let agent_context = agent_context
            .with_tool_definitions(schema.tool_definitions)
            .with_definition_version(execution.definition_version().map(str::to_string));

        if schema.gateway_tool_definitions.is_empty() {
            debug!(tools = agent_context.tool_definitions.len(), "no gateway tools, agent is ready");
            return Ok(AgentInitializationResult::Ready {
                agent_context: agent_context.with_state(AgentState::Ready),
                tool_call_results,
            });
        }

        let initiation = self
            .gateways
            .initiate_tool_discovery(agent_context, &schema.gateway_tool_definitions);
        if initiation.tool_discovery_tool_calls.is_empty() {
            return Ok(AgentInitializationResult::Ready {
                agent_context: initiation.agent_context.with_state(AgentState::Ready),
                tool_call_results,
            });
        }

        info!(
            tool_calls = initiation.tool_discovery_tool_calls.len(),
            "initiated gateway tool discovery"
        );
        Ok(AgentInitializationResult::DirectResponse(AgentResponse::with_tool_calls(
            initiation.agent_context.with_state(AgentState::ToolDiscovery),
            initiation.tool_discovery_tool_calls,
        )))
    }

    fn handle_tool_discovery(
        &self,
        agent_context: AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<AgentInitializationResult> {
        if !self
            .gateways
            .all_tool_discovery_results_present(&agent_context, &tool_call_results)
        {
            debug!("tool discovery results incomplete");
            return Ok(AgentInitializationResult::DiscoveryInProgress);
        }

        let (agent_context, remaining) = self
            .gateways
            .handle_tool_discovery_results(agent_context, tool_call_results)?;
        info!(tools = agent_context.tool_definitions.len(), "tool discovery completed, agent is ready");
        Ok(AgentInitializationResult::Ready {
            agent_context: agent_context.with_state(AgentState::Ready),
            tool_call_results: remaining,
        })
    }

    /// Reconcile tools when the caller runs a different definition version than the context.
    async fn migrate_if_needed(
        &self,
        execution: &AgentExecutionContext,
        agent_context: AgentContext,
    ) -> Result<AgentContext> {
        let Some(current) = execution.definition_version() else {
            return Ok(agent_context);
        };
        match agent_context.definition_version.as_deref() {
            Some(recorded) if recorded != current => {
                info!(from = %recorded, to = %current, "definition version changed, updating tool definitions");
                let current = current.to_string();
                let updated = self.tools.update_tool_definitions(execution, agent_context).await?;
                Ok(updated.with_definition_version(Some(current)))
            }
            Some(_) => Ok(agent_context),
            // nothing recorded yet: adopt the version without reconciling
            None => Ok(agent_context.with_definition_version(Some(current.to_string()))),
        }
    }
}
