//! Adding the turn's input to runtime memory.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::context::AgentContext;
use crate::error::{AgentError, ErrorCode, Result};
use crate::gateway::GatewayToolHandlerRegistry;
use crate::memory::RuntimeMemory;
use crate::request::{AgentExecutionContext, EventHandlingBehavior, UserPromptConfiguration};
use crate::template;
use crate::types::{
    Content, Message, ToolCall, ToolCallResult, ToolCallResultMessage, UserMessage, METADATA_TIMESTAMP,
};

/// Turns prompts and tool call results into memory messages.
#[derive(Debug, Clone)]
pub struct AgentMessagesHandler {
    gateways: Arc<GatewayToolHandlerRegistry>,
}

impl AgentMessagesHandler {
    pub fn new(gateways: Arc<GatewayToolHandlerRegistry>) -> Self {
        Self { gateways }
    }

    /// Render the system prompt and add it, replacing any previous system message.
    pub fn add_system_message(&self, execution: &AgentExecutionContext, memory: &mut dyn RuntimeMemory) -> Result<()> {
        let config = &execution.request.system_prompt;
        let prompt = template::render(config.prompt_or_default(), &config.parameters)?;
        if prompt.trim().is_empty() {
            trace!("system prompt is blank, not adding a system message");
            return Ok(());
        }
        memory.add_message(Message::system(prompt));
        Ok(())
    }

    /// Add the user prompt or the results of pending tool calls.
    ///
    /// Returns the messages appended to memory. An empty list means there is nothing
    /// to send to the model this turn, e.g. because tool call results are incomplete.
    pub fn add_user_messages(
        &self,
        execution: &AgentExecutionContext,
        agent_context: &AgentContext,
        memory: &mut dyn RuntimeMemory,
        tool_call_results: Vec<ToolCallResult>,
    ) -> Result<Vec<Message>> {
        if !agent_context.has_conversation() && !tool_call_results.is_empty() {
            return Err(AgentError::agent(
                ErrorCode::ToolCallResultsOnEmptyContext,
                "Agent received tool call results, but the agent context was empty (no tool call requests). \
                 Is the context configured correctly?",
            ));
        }

        let (events, results): (Vec<_>, Vec<_>) = tool_call_results.into_iter().partition(ToolCallResult::is_event);

        let pending_tool_calls = memory
            .last_message()
            .and_then(Message::as_assistant)
            .filter(|assistant| assistant.has_tool_calls())
            .map(|assistant| assistant.tool_calls.clone());

        let mut added = match pending_tool_calls {
            Some(pending) => {
                let results = self.gateways.transform_tool_call_results(agent_context, results);
                let interrupt = !events.is_empty()
                    && execution.event_behavior() == EventHandlingBehavior::InterruptToolCalls;
                match correlate(&pending, results, interrupt) {
                    Some(ordered) => vec![Message::ToolCallResult(ToolCallResultMessage {
                        results: ordered,
                        metadata: timestamp_metadata(),
                    })],
                    None => {
                        debug!(pending = pending.len(), "tool call results incomplete, waiting for more input");
                        return Ok(Vec::new());
                    }
                }
            }
            None => user_prompt_message(&execution.request.user_prompt)?.into_iter().collect(),
        };

        added.extend(events.into_iter().map(event_message));

        memory.add_messages(added.clone());
        Ok(added)
    }
}

/// Order results by the pending calls. Missing results are cancelled when `interrupt` is
/// set, otherwise the correlation is incomplete.
fn correlate(pending: &[ToolCall], mut results: Vec<ToolCallResult>, interrupt: bool) -> Option<Vec<ToolCallResult>> {
    let mut ordered = Vec::with_capacity(pending.len());
    for call in pending {
        match results.iter().position(|r| r.id.as_deref() == Some(call.id.as_str())) {
            Some(index) => ordered.push(results.swap_remove(index)),
            None if interrupt => ordered.push(ToolCallResult::interrupted(call)),
            None => return None,
        }
    }
    Some(ordered)
}

fn user_prompt_message(config: &UserPromptConfiguration) -> Result<Option<Message>> {
    let mut content = Vec::new();
    if let Some(prompt) = config.prompt.as_deref() {
        let prompt = template::render(prompt, &config.parameters)?;
        if !prompt.trim().is_empty() {
            content.push(Content::text(prompt));
        }
    }
    content.extend(config.documents.iter().cloned().map(Content::document));

    if content.is_empty() {
        return Ok(None);
    }
    Ok(Some(Message::User(UserMessage::timestamped(content))))
}

fn event_message(event: ToolCallResult) -> Message {
    let content = match event.content {
        Value::String(text) => Content::text(text),
        other => Content::object(other),
    };
    Message::User(UserMessage::timestamped(vec![content]))
}

fn timestamp_metadata() -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert(METADATA_TIMESTAMP.to_string(), Value::String(Utc::now().to_rfc3339()));
    metadata
}
