//! Building the caller-facing response of a turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::request::{AgentExecutionContext, ResponseConfiguration, ResponseFormatConfiguration};
use crate::types::{AssistantMessage, ToolCall};

/// Output of a completed turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub context: AgentContext,
    /// Tool calls the caller has to execute, in caller-facing form.
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_json: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_message: Option<AssistantMessage>,
}

impl AgentResponse {
    /// Response carrying only a context and tool calls, e.g. tool discovery.
    pub fn with_tool_calls(context: AgentContext, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            context,
            tool_calls,
            ..Default::default()
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Maps the assistant reply to an [`AgentResponse`] according to the response configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct AgentResponseHandler;

impl AgentResponseHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn create_response(
        &self,
        execution: &AgentExecutionContext,
        agent_context: AgentContext,
        assistant_message: AssistantMessage,
        tool_calls: Vec<ToolCall>,
    ) -> Result<AgentResponse> {
        let default_config = ResponseConfiguration::default();
        let config = execution.response_configuration().unwrap_or(&default_config);
        let text = assistant_message.text().map(str::to_string);

        let (response_text, response_json) = match &config.format {
            ResponseFormatConfiguration::Text { parse_json } => {
                let json = match (&text, parse_json) {
                    (Some(text), true) => parse_lenient(text),
                    _ => None,
                };
                (text, json)
            }
            ResponseFormatConfiguration::Json { .. } => {
                let json = text.as_deref().map(parse_strict).transpose()?;
                (None, json)
            }
        };

        Ok(AgentResponse {
            context: agent_context,
            tool_calls,
            response_text,
            response_json,
            response_message: config.include_assistant_message.then_some(assistant_message),
        })
    }
}

fn parse_lenient(text: &str) -> Option<Value> {
    match serde_json::from_str(&strip_code_fences(text)) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(error = %err, "response text is not valid JSON, returning text only");
            None
        }
    }
}

fn parse_strict(text: &str) -> Result<Value> {
    serde_json::from_str(&strip_code_fences(text)).map_err(|err| {
        AgentError::agent(
            ErrorCode::FailedToParseResponseContent,
            format!("Failed to parse response content as JSON: {err}"),
        )
    })
}

/// Strip a surrounding markdown code fence, including any info string after the opening fence.
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(after_fence) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = match after_fence.split_once('\n') {
        Some((_info, rest)) => rest,
        // single line: ```json {"a":1}```
        None => after_fence.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
    };
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}
