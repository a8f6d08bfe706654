//! Gateway tools: tools hosted by an external registry rather than declared locally.
//!
//! Gateway handlers take part in a two-phase discovery: they first emit discovery
//! tool calls, then turn the returned results into tool definitions. They also
//! rewrite calls and results between the model-facing names and the names the
//! external host understands.

pub mod mcp;
pub mod registry;

pub use mcp::McpClientGatewayToolHandler;
pub use registry::GatewayToolHandlerRegistry;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::AgentContext;
use crate::error::Result;
use crate::types::{ToolCall, ToolCallResult, ToolDefinition};

/// A gateway declared alongside local tools, e.g. an MCP client element.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GatewayToolDefinition {
    /// Handler type responsible for this gateway.
    #[builder(into)]
    #[serde(rename = "type")]
    pub gateway_type: String,
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

/// Outcome of starting discovery: an updated context plus the calls to emit.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayToolDiscoveryInitiationResult {
    pub agent_context: AgentContext,
    pub tool_discovery_tool_calls: Vec<ToolCall>,
}

/// Gateway names added or removed since the conversation started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewayToolDefinitionUpdates {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl GatewayToolDefinitionUpdates {
    pub fn new(added: Vec<String>, removed: Vec<String>) -> Self {
        Self { added, removed }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Handler for one type of gateway.
pub trait GatewayToolHandler: Send + Sync {
    /// Gateway type handled, matched against [`GatewayToolDefinition::gateway_type`].
    fn gateway_type(&self) -> &str;

    /// Whether a tool in the context's tool list was produced by this handler.
    fn is_gateway_managed(&self, agent_context: &AgentContext, tool_name: &str) -> bool;

    fn initiate_tool_discovery(
        &self,
        agent_context: AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDiscoveryInitiationResult;

    fn all_tool_discovery_results_present(
        &self,
        agent_context: &AgentContext,
        tool_call_results: &[ToolCallResult],
    ) -> bool;

    fn handles_tool_discovery_result(&self, tool_call_result: &ToolCallResult) -> bool;

    fn handle_tool_discovery_results(
        &self,
        agent_context: &AgentContext,
        tool_discovery_results: &[ToolCallResult],
    ) -> Result<Vec<ToolDefinition>>;

    /// Rewrite calls emitted by the model into the gateway's representation.
    fn transform_tool_calls(&self, agent_context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall>;

    /// Rewrite results from the gateway back into the model-facing representation.
    fn transform_tool_call_results(
        &self,
        agent_context: &AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Vec<ToolCallResult>;

    fn resolve_updated_gateway_tool_definitions(
        &self,
        agent_context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionUpdates;
}
