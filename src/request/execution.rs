//! Per-invocation execution context.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::context::AgentContext;
use crate::types::ToolCallResult;

use super::{
    AgentRequest, EventHandlingBehavior, MemoryStorageConfiguration, ResponseConfiguration,
};

/// Caller-specific metadata about the invocation, opaque to the core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvocationMetadata {
    /// Version of the definition that declares the tools (e.g. a workflow definition key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_version: Option<String>,
    /// Element hosting the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_key: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

/// Resolved request plus invocation metadata for a single turn.
#[derive(Debug, Clone, Builder, Default)]
pub struct AgentExecutionContext {
    pub request: AgentRequest,
    #[builder(default)]
    pub metadata: InvocationMetadata,
}

impl AgentExecutionContext {
    pub fn new(request: AgentRequest) -> Self {
        Self {
            request,
            metadata: InvocationMetadata::default(),
        }
    }

    /// Context supplied with the request, or an empty one for a new conversation.
    pub fn initial_agent_context(&self) -> AgentContext {
        self.request.context.clone().unwrap_or_default()
    }

    pub fn tool_call_results(&self) -> &[ToolCallResult] {
        &self.request.tools.tool_call_results
    }

    pub fn container_element_id(&self) -> Option<&str> {
        self.request.tools.container()
    }

    pub fn memory_storage(&self) -> &MemoryStorageConfiguration {
        &self.request.memory.storage
    }

    pub fn event_behavior(&self) -> EventHandlingBehavior {
        self.request.events.behavior
    }

    pub fn response_configuration(&self) -> Option<&ResponseConfiguration> {
        self.request.response.as_ref()
    }

    pub fn definition_version(&self) -> Option<&str> {
        self.metadata.definition_version.as_deref()
    }
}
