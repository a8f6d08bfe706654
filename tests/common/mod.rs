//! Shared test helpers: scripted model adapter, recording job client, fixtures.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use agentic::agent::{AgentRequestHandler, JobClient, JobCompletion, TurnCompleter};
use agentic::context::AgentContext;
use agentic::error::{AgentError, Result};
use agentic::framework::{ChatResponse, FrameworkAdapter};
use agentic::gateway::{GatewayToolHandlerRegistry, McpClientGatewayToolHandler};
use agentic::memory::RuntimeMemory;
use agentic::request::{AgentExecutionContext, AgentRequest, InvocationMetadata, ToolsConfiguration, UserPromptConfiguration};
use agentic::tools::{AdHocToolsSchema, StaticToolsSchemaResolver};
use agentic::types::*;

pub const TOOLS_CONTAINER: &str = "agent_tools";

/// What the adapter saw for one chat request.
#[derive(Debug, Clone)]
pub struct RecordedChatRequest {
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

/// A model that replies with queued assistant messages.
#[derive(Default)]
pub struct ScriptedAdapter {
    replies: Mutex<VecDeque<AssistantMessage>>,
    requests: Mutex<Vec<RecordedChatRequest>>,
}

impl ScriptedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text reply.
    pub fn queue_text(&self, text: &str) {
        self.queue(AssistantMessage {
            content: vec![Content::text(text)],
            ..Default::default()
        });
    }

    /// Queue a reply requesting one tool call.
    pub fn queue_tool_call(&self, id: &str, name: &str, arguments: Value) {
        self.queue_tool_calls(vec![ToolCall::new(id, name, object(arguments))]);
    }

    pub fn queue_tool_calls(&self, tool_calls: Vec<ToolCall>) {
        self.queue(AssistantMessage {
            tool_calls,
            ..Default::default()
        });
    }

    pub fn queue(&self, reply: AssistantMessage) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<RecordedChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl FrameworkAdapter for ScriptedAdapter {
    async fn execute_chat_request(
        &self,
        _execution: &AgentExecutionContext,
        agent_context: AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(RecordedChatRequest {
            messages: memory.filtered_messages(),
            tool_names: agent_context.tool_definitions.iter().map(|t| t.name.clone()).collect(),
        });

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AgentError::api(500, "no scripted reply left"))?;
        let metrics = agent_context
            .metrics
            .increment_model_calls(1)
            .increment_token_usage(TokenUsage::new(10, 20));
        Ok(ChatResponse {
            agent_context: agent_context.with_metrics(metrics),
            assistant_message: reply,
        })
    }
}

/// Job client recording every completion, optionally failing the commit.
#[derive(Default)]
pub struct RecordingJobClient {
    completions: Mutex<Vec<JobCompletion>>,
    fail_with: Mutex<Option<String>>,
}

impl RecordingJobClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        let client = Self::default();
        *client.fail_with.lock().unwrap() = Some(message.to_string());
        client
    }

    pub fn completions(&self) -> Vec<JobCompletion> {
        self.completions.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobClient for RecordingJobClient {
    async fn complete_job(&self, _execution: &AgentExecutionContext, completion: JobCompletion) -> Result<()> {
        if let Some(message) = self.fail_with.lock().unwrap().clone() {
            return Err(AgentError::api(404, message));
        }
        self.completions.lock().unwrap().push(completion);
        Ok(())
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

pub fn weather_tool() -> ToolDefinition {
    ToolDefinition::new(
        "getWeather",
        "Current weather for a city",
        json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}),
    )
}

pub fn time_tool() -> ToolDefinition {
    ToolDefinition::new("getTime", "Current time", json!({"type": "object"}))
}

pub fn gateway_registry() -> GatewayToolHandlerRegistry {
    GatewayToolHandlerRegistry::with_handlers(vec![Arc::new(McpClientGatewayToolHandler)]).unwrap()
}

pub fn handler<C: TurnCompleter>(
    adapter: Arc<ScriptedAdapter>,
    schema: AdHocToolsSchema,
    completer: C,
) -> AgentRequestHandler<C> {
    AgentRequestHandler::with_gateways(
        adapter,
        Arc::new(StaticToolsSchemaResolver::new().with_container(TOOLS_CONTAINER, schema)),
        gateway_registry(),
        completer,
    )
}

/// First turn request with a prompt and the tools container.
pub fn prompt_request(prompt: &str) -> AgentRequest {
    AgentRequest {
        user_prompt: UserPromptConfiguration::new(prompt),
        tools: ToolsConfiguration {
            container_element_id: Some(TOOLS_CONTAINER.to_string()),
            tool_call_results: vec![],
        },
        ..Default::default()
    }
}

/// Follow-up request resuming `context` with tool call results.
pub fn resume_request(base: &AgentRequest, context: AgentContext, results: Vec<ToolCallResult>) -> AgentRequest {
    AgentRequest {
        context: Some(context),
        tools: ToolsConfiguration {
            container_element_id: base.tools.container_element_id.clone(),
            tool_call_results: results,
        },
        ..base.clone()
    }
}

pub fn execution(request: AgentRequest) -> AgentExecutionContext {
    AgentExecutionContext::new(request)
}

pub fn versioned_execution(request: AgentRequest, version: &str) -> AgentExecutionContext {
    AgentExecutionContext {
        request,
        metadata: InvocationMetadata {
            definition_version: Some(version.to_string()),
            ..Default::default()
        },
    }
}
