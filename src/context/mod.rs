//! Agent context: the state carried between invocations.
//!
//! The engine never mutates a caller's context in place. Every operation takes a
//! context by value (or clones it) and hands back an updated copy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::types::{AgentMetrics, Document, Message, ToolDefinition};

/// Lifecycle state of an agent conversation.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    /// Brand-new conversation, tools not resolved yet.
    #[default]
    Initializing,
    /// Waiting for gateway discovery tool calls to return.
    ToolDiscovery,
    Ready,
    /// Tool calls emitted by the model are pending.
    WaitingForToolInput,
}

impl AgentState {
    /// Whether tools have been resolved for this conversation.
    pub fn is_initialized(self) -> bool {
        matches!(self, Self::Ready | Self::WaitingForToolInput)
    }
}

/// Handle a conversation store uses to locate the history of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConversationContext {
    /// History embedded in the context itself.
    InProcess {
        #[serde(default)]
        messages: Vec<Message>,
    },
    /// History persisted as a document; only the reference travels with the context.
    #[serde(rename_all = "camelCase")]
    Document {
        conversation_id: String,
        document: Document,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        previous_documents: Vec<Document>,
    },
    /// Handle owned by a caller-provided store.
    #[serde(rename_all = "camelCase")]
    Custom {
        store_type: String,
        conversation_id: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        data: Map<String, Value>,
    },
}

impl ConversationContext {
    /// Storage type that produced this handle.
    pub fn store_type(&self) -> &str {
        match self {
            Self::InProcess { .. } => "in-process",
            Self::Document { .. } => "document",
            Self::Custom { store_type, .. } => store_type,
        }
    }

    pub fn conversation_id(&self) -> Option<&str> {
        match self {
            Self::InProcess { .. } => None,
            Self::Document {
                conversation_id, ..
            }
            | Self::Custom {
                conversation_id, ..
            } => Some(conversation_id),
        }
    }
}

/// Serializable agent state carried between invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentContext {
    #[serde(default)]
    pub state: AgentState,
    #[serde(default)]
    pub metrics: AgentMetrics,
    #[serde(default)]
    pub tool_definitions: Vec<ToolDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationContext>,
    /// Free-form properties maintained by gateway handlers.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Version of the tool declarations the tool list was resolved against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_version: Option<String>,
}

impl AgentContext {
    /// Context of a brand-new conversation.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_state(self, state: AgentState) -> Self {
        Self { state, ..self }
    }

    pub fn with_metrics(self, metrics: AgentMetrics) -> Self {
        Self { metrics, ..self }
    }

    pub fn with_tool_definitions(self, tool_definitions: Vec<ToolDefinition>) -> Self {
        Self {
            tool_definitions,
            ..self
        }
    }

    pub fn with_conversation(self, conversation: ConversationContext) -> Self {
        Self {
            conversation: Some(conversation),
            ..self
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(self, properties: Map<String, Value>) -> Self {
        Self { properties, ..self }
    }

    pub fn with_definition_version(self, version: Option<String>) -> Self {
        Self {
            definition_version: version,
            ..self
        }
    }

    /// Whether a previous turn stored any conversation history.
    pub fn has_conversation(&self) -> bool {
        self.conversation.is_some()
    }

    pub fn tool_definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.tool_definitions.iter().find(|tool| tool.name == name)
    }
}
