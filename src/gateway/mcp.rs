//! Gateway handler exposing tools of MCP client elements to the model.
//!
//! Each MCP client is asked for its tools with a `tools/list` discovery call.
//! Discovered tools are offered to the model as `MCP_<client>___<tool>` and calls
//! to them are rewritten into `tools/call` requests addressed to the client.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::types::{ToolCall, ToolCallResult, ToolDefinition};

use super::{
    GatewayToolDefinition, GatewayToolDefinitionUpdates, GatewayToolDiscoveryInitiationResult,
    GatewayToolHandler,
};

pub const GATEWAY_TYPE: &str = "mcpClient";
/// Context property listing the MCP clients seen at discovery time.
pub const PROPERTY_MCP_CLIENTS: &str = "mcpClients";

const TOOL_NAME_PREFIX: &str = "MCP_";
const TOOL_NAME_SEPARATOR: &str = "___";
const DISCOVERY_ID_PREFIX: &str = "MCP_toolsList_";
const METHOD_TOOLS_LIST: &str = "tools/list";
const METHOD_TOOLS_CALL: &str = "tools/call";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListToolsResult {
    #[serde(default)]
    tool_definitions: Vec<ToolDefinition>,
}

#[derive(Debug, Deserialize)]
struct CallToolResult {
    name: String,
    #[serde(default)]
    content: Vec<Value>,
}

/// Handler for gateways of type `mcpClient`.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpClientGatewayToolHandler;

impl McpClientGatewayToolHandler {
    pub fn new() -> Self {
        Self
    }

    fn tool_name(client: &str, tool: &str) -> String {
        format!("{TOOL_NAME_PREFIX}{client}{TOOL_NAME_SEPARATOR}{tool}")
    }

    /// Split `MCP_<client>___<tool>` into its client and tool parts.
    fn split_tool_name(name: &str) -> Option<(&str, &str)> {
        name.strip_prefix(TOOL_NAME_PREFIX)?
            .split_once(TOOL_NAME_SEPARATOR)
    }

    fn client_names(definitions: &[GatewayToolDefinition]) -> Vec<String> {
        definitions
            .iter()
            .filter(|d| d.gateway_type == GATEWAY_TYPE)
            .map(|d| d.name.clone())
            .collect()
    }

    fn known_clients(agent_context: &AgentContext) -> Vec<String> {
        agent_context
            .properties
            .get(PROPERTY_MCP_CLIENTS)
            .and_then(Value::as_array)
            .map(|clients| {
                clients
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl GatewayToolHandler for McpClientGatewayToolHandler {
    fn gateway_type(&self) -> &str {
        GATEWAY_TYPE
    }

    fn is_gateway_managed(&self, agent_context: &AgentContext, tool_name: &str) -> bool {
        Self::split_tool_name(tool_name)
            .is_some_and(|(client, _)| Self::known_clients(agent_context).iter().any(|c| c == client))
    }

    fn initiate_tool_discovery(
        &self,
        agent_context: AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDiscoveryInitiationResult {
        let clients = Self::client_names(gateway_tool_definitions);
        if clients.is_empty() {
            return GatewayToolDiscoveryInitiationResult {
                agent_context,
                tool_discovery_tool_calls: Vec::new(),
            };
        }

        let tool_discovery_tool_calls = clients
            .iter()
            .map(|client| {
                let mut arguments = Map::new();
                arguments.insert("method".into(), Value::String(METHOD_TOOLS_LIST.into()));
                ToolCall::new(format!("{DISCOVERY_ID_PREFIX}{client}"), client.clone(), arguments)
            })
            .collect();

        GatewayToolDiscoveryInitiationResult {
            agent_context: agent_context.with_property(PROPERTY_MCP_CLIENTS, clients),
            tool_discovery_tool_calls,
        }
    }

    fn all_tool_discovery_results_present(
        &self,
        agent_context: &AgentContext,
        tool_call_results: &[ToolCallResult],
    ) -> bool {
        Self::known_clients(agent_context).iter().all(|client| {
            let expected_id = format!("{DISCOVERY_ID_PREFIX}{client}");
            let present = tool_call_results
                .iter()
                .any(|r| r.id.as_deref() == Some(expected_id.as_str()));
            if !present {
                debug!(client = %client, "missing MCP tool discovery result");
            }
            present
        })
    }

    fn handles_tool_discovery_result(&self, tool_call_result: &ToolCallResult) -> bool {
        tool_call_result
            .id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty() && id.starts_with(DISCOVERY_ID_PREFIX))
    }

    fn handle_tool_discovery_results(
        &self,
        _agent_context: &AgentContext,
        tool_discovery_results: &[ToolCallResult],
    ) -> Result<Vec<ToolDefinition>> {
        let mut definitions = Vec::new();
        for result in tool_discovery_results {
            let client = result.name.as_deref().unwrap_or_default();
            let listed: ListToolsResult = serde_json::from_value(result.content.clone()).map_err(|err| {
                AgentError::InvalidArgument(format!(
                    "Invalid MCP tool discovery result for client '{client}': {err}"
                ))
            })?;
            definitions.extend(listed.tool_definitions.into_iter().map(|tool| ToolDefinition {
                name: Self::tool_name(client, &tool.name),
                ..tool
            }));
        }
        Ok(definitions)
    }

    fn transform_tool_calls(&self, agent_context: &AgentContext, tool_calls: Vec<ToolCall>) -> Vec<ToolCall> {
        let clients = Self::known_clients(agent_context);
        tool_calls
            .into_iter()
            .map(|call| {
                let Some((client, tool)) = Self::split_tool_name(&call.name)
                    .filter(|(client, _)| clients.iter().any(|c| c == client))
                else {
                    return call;
                };
                let mut arguments = Map::new();
                arguments.insert("method".into(), Value::String(METHOD_TOOLS_CALL.into()));
                arguments.insert(
                    "params".into(),
                    json!({ "name": tool, "arguments": Value::Object(call.arguments.clone()) }),
                );
                ToolCall::new(call.id.clone(), client, arguments)
            })
            .collect()
    }

    fn transform_tool_call_results(
        &self,
        agent_context: &AgentContext,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Vec<ToolCallResult> {
        let clients = Self::known_clients(agent_context);
        tool_call_results
            .into_iter()
            .map(|result| {
                let Some(client) = result
                    .name
                    .clone()
                    .filter(|name| clients.iter().any(|c| c == name))
                else {
                    return result;
                };
                let Ok(call_result) = serde_json::from_value::<CallToolResult>(result.content.clone()) else {
                    return result;
                };
                let name = Self::tool_name(&client, &call_result.name);
                let content = collapse_single_text(call_result.content);
                ToolCallResult {
                    name: Some(name),
                    content,
                    ..result
                }
            })
            .collect()
    }

    fn resolve_updated_gateway_tool_definitions(
        &self,
        agent_context: &AgentContext,
        gateway_tool_definitions: &[GatewayToolDefinition],
    ) -> GatewayToolDefinitionUpdates {
        let previous = Self::known_clients(agent_context);
        let current = Self::client_names(gateway_tool_definitions);

        let added = current
            .iter()
            .filter(|c| !previous.contains(c))
            .cloned()
            .collect();
        let removed = previous
            .iter()
            .filter(|c| !current.contains(c))
            .cloned()
            .collect();
        GatewayToolDefinitionUpdates::new(added, removed)
    }
}

/// A lone text block becomes its text; anything else stays a list of blocks.
fn collapse_single_text(mut content: Vec<Value>) -> Value {
    let is_single_text = content.len() == 1
        && content[0].get("type").and_then(Value::as_str) == Some("text");
    if is_single_text {
        if let Some(text) = content.pop().and_then(|mut block| block.get_mut("text").map(Value::take)) {
            return text;
        }
        return Value::Null;
    }
    Value::Array(content)
}
