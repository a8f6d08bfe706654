//! Request configuration resolved by the caller for one invocation.
//!
//! All types are plain serde data in `camelCase` so a caller can hand over the
//! JSON it already has.

pub mod execution;

pub use execution::{AgentExecutionContext, InvocationMetadata};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::types::{Document, ToolCallResult};

/// Smallest window that still holds a tool call together with its results.
pub const MIN_CONTEXT_WINDOW_SIZE: usize = 3;
pub const MIN_MAX_MODEL_CALLS: u32 = 1;

/// Prompt used when a request configures no system prompt at all.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are **TaskAgent**, a helpful, generic chat agent that can handle a wide variety of customer requests using your own domain knowledge **and** any tools explicitly provided to you at runtime.

If tools are provided, you should prefer them instead of guessing an answer. You can call the same tool multiple times by providing different input values. Don't guess any tools which were not explicitly configured. If no tool matches the request, try to generate an answer. If you're not able to find a good answer, return with a message stating why you're not able to.

Wrap minimal, inspectable reasoning in *exactly* this XML template:

<thinking>
  <context>…briefly state the customer's need and current state…</context>
  <reflection>…list candidate tools, justify which you will call next and why…</reflection>
</thinking>

Reveal **no** additional private reasoning outside these tags.";

/// Full request for one agent turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    /// Context returned by the previous turn; absent for a new conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<AgentContext>,
    #[serde(default)]
    pub system_prompt: SystemPromptConfiguration,
    #[serde(default)]
    pub user_prompt: UserPromptConfiguration,
    #[serde(default)]
    pub tools: ToolsConfiguration,
    #[serde(default)]
    pub memory: MemoryConfiguration,
    #[serde(default)]
    pub limits: LimitsConfiguration,
    #[serde(default)]
    pub events: EventConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseConfiguration>,
}

impl AgentRequest {
    /// Reject window sizes and limits outside their allowed ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(size) = self.memory.context_window_size {
            validate_context_window_size(size)?;
        }
        if let Some(limit) = self.limits.max_model_calls {
            validate_max_model_calls(limit)?;
        }
        Ok(())
    }
}

pub fn validate_context_window_size(size: usize) -> Result<()> {
    if size < MIN_CONTEXT_WINDOW_SIZE {
        return Err(AgentError::InvalidArgument(format!(
            "contextWindowSize must be at least {MIN_CONTEXT_WINDOW_SIZE}, got {size}"
        )));
    }
    Ok(())
}

pub fn validate_max_model_calls(limit: u32) -> Result<()> {
    if limit < MIN_MAX_MODEL_CALLS {
        return Err(AgentError::InvalidArgument(format!(
            "maxModelCalls must be at least {MIN_MAX_MODEL_CALLS}, got {limit}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SystemPromptConfiguration {
    /// `None` selects [`DEFAULT_SYSTEM_PROMPT`]; a blank prompt adds no system message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

impl SystemPromptConfiguration {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            parameters: Map::new(),
        }
    }

    pub fn prompt_or_default(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPromptConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,
}

impl UserPromptConfiguration {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfiguration {
    /// Element whose children are offered as tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_element_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_results: Vec<ToolCallResult>,
}

impl ToolsConfiguration {
    /// Container id, `None` when blank.
    pub fn container(&self) -> Option<&str> {
        self.container_element_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemoryConfiguration {
    #[serde(default)]
    pub storage: MemoryStorageConfiguration,
    /// Maximum number of recent messages passed to the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window_size: Option<usize>,
}

/// How conversation history is stored between invocations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MemoryStorageConfiguration {
    #[default]
    InProcess,
    #[serde(rename_all = "camelCase")]
    Document {
        /// Retention hint in seconds passed to the document store.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_to_live_secs: Option<u64>,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        custom_properties: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    Custom {
        store_type: String,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        parameters: Map<String, Value>,
    },
}

impl MemoryStorageConfiguration {
    pub fn store_type(&self) -> &str {
        match self {
            Self::InProcess => "in-process",
            Self::Document { .. } => "document",
            Self::Custom { store_type, .. } => store_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LimitsConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_model_calls: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventConfiguration {
    #[serde(default)]
    pub behavior: EventHandlingBehavior,
}

/// What to do when an event arrives while tool calls are still pending.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventHandlingBehavior {
    /// Keep waiting until every pending tool call has a result.
    #[default]
    WaitForToolCallResults,
    /// Cancel pending tool calls and let the model react to the event.
    InterruptToolCalls,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfiguration {
    #[serde(default)]
    pub format: ResponseFormatConfiguration,
    #[serde(default)]
    pub include_assistant_message: bool,
}

/// Shape of the response content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormatConfiguration {
    #[serde(rename_all = "camelCase")]
    Text {
        /// Best-effort parse of the text as JSON.
        #[serde(default)]
        parse_json: bool,
    },
    #[serde(rename_all = "camelCase")]
    Json {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema_name: Option<String>,
    },
}

impl Default for ResponseFormatConfiguration {
    fn default() -> Self {
        Self::Text { parse_json: false }
    }
}
