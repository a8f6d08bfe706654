//! OpenAI-compatible Chat Completions adapter.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::context::AgentContext;
use crate::error::{AgentError, Result};
use crate::memory::RuntimeMemory;
use crate::request::{AgentExecutionContext, ResponseFormatConfiguration};
use crate::types::{
    AssistantMessage, Content, Document, Message, TokenUsage, ToolCall, ToolCallResult, ToolDefinition,
};

use super::http::{bearer_headers, build_client, status_to_error};
use super::{ChatResponse, FrameworkAdapter};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Adapter for any endpoint speaking the OpenAI Chat Completions protocol.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiChatAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatAdapter")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl OpenAiChatAdapter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, base_url: Option<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AgentError::Configuration("OpenAI API key is not set".into()));
        }
        Ok(Self {
            client: build_client()?,
            api_key,
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request_body(
        &self,
        execution: &AgentExecutionContext,
        agent_context: &AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<Value> {
        let mut messages = Vec::new();
        for message in memory.filtered_messages() {
            append_openai_messages(&message, &mut messages)?;
        }

        let mut body = Map::new();
        body.insert("model".into(), Value::String(self.model.clone()));
        body.insert("messages".into(), Value::Array(messages));

        if !agent_context.tool_definitions.is_empty() {
            let tools = agent_context
                .tool_definitions
                .iter()
                .map(tool_to_openai)
                .collect::<Vec<_>>();
            body.insert("tools".into(), Value::Array(tools));
        }

        if let Some(ResponseFormatConfiguration::Json { schema, schema_name }) =
            execution.response_configuration().map(|r| &r.format)
        {
            let format = match schema {
                Some(schema) => json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": schema_name.as_deref().unwrap_or("Response"),
                        "schema": schema,
                        "strict": true,
                    }
                }),
                None => json!({"type": "json_object"}),
            };
            body.insert("response_format".into(), format);
        }

        Ok(Value::Object(body))
    }
}

#[async_trait]
impl FrameworkAdapter for OpenAiChatAdapter {
    async fn execute_chat_request(
        &self,
        execution: &AgentExecutionContext,
        agent_context: AgentContext,
        memory: &dyn RuntimeMemory,
    ) -> Result<ChatResponse> {
        let body = self.build_request_body(execution, &agent_context, memory)?;
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %self.model, tools = agent_context.tool_definitions.len(), "OpenAI chat request");

        let resp = self
            .client
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let data: OpenAiChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::api(200, "No choices in OpenAI response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.id, tc.function.name.clone(), parse_arguments(&tc.function)))
            .collect();

        let content = choice
            .message
            .content
            .filter(|text| !text.is_empty())
            .map(|text| vec![Content::text(text)])
            .unwrap_or_default();

        let usage = data
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();
        let metrics = agent_context
            .metrics
            .increment_model_calls(1)
            .increment_token_usage(usage);

        Ok(ChatResponse {
            agent_context: agent_context.with_metrics(metrics),
            assistant_message: AssistantMessage {
                content,
                tool_calls,
                metadata: Map::new(),
            },
        })
    }
}

fn parse_arguments(function: &OpenAiFunction) -> Map<String, Value> {
    match serde_json::from_str::<Value>(&function.arguments) {
        Ok(Value::Object(arguments)) => arguments,
        _ => {
            warn!(tool = %function.name, "tool call arguments are not a JSON object, ignoring them");
            Map::new()
        }
    }
}

fn tool_to_openai(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}

fn append_openai_messages(message: &Message, out: &mut Vec<Value>) -> Result<()> {
    match message {
        Message::System(system) => {
            out.push(json!({"role": "system", "content": joined_text(&system.content)}));
        }
        Message::User(user) => {
            let mut parts = Vec::with_capacity(user.content.len());
            for block in &user.content {
                parts.push(content_part(block)?);
            }
            let content = match parts.as_slice() {
                [single] if single["type"] == "text" => single["text"].clone(),
                _ => Value::Array(parts),
            };
            let mut entry = json!({"role": "user", "content": content});
            if let Some(name) = &user.name {
                entry["name"] = Value::String(name.clone());
            }
            out.push(entry);
        }
        Message::Assistant(assistant) => {
            let text = joined_text(&assistant.content);
            let mut entry = json!({
                "role": "assistant",
                "content": if text.is_empty() { Value::Null } else { Value::String(text) },
            });
            if assistant.has_tool_calls() {
                entry["tool_calls"] = assistant
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": Value::Object(tc.arguments.clone()).to_string(),
                            }
                        })
                    })
                    .collect();
            }
            out.push(entry);
        }
        Message::ToolCallResult(results) => {
            out.extend(results.results.iter().map(tool_result_to_openai));
        }
    }
    Ok(())
}

fn tool_result_to_openai(result: &ToolCallResult) -> Value {
    let content = match &result.content {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    json!({
        "role": "tool",
        "tool_call_id": result.id,
        "content": content,
    })
}

fn joined_text(content: &[Content]) -> String {
    content
        .iter()
        .filter_map(|block| match block {
            Content::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn content_part(block: &Content) -> Result<Value> {
    Ok(match block {
        Content::Text { text } => json!({"type": "text", "text": text}),
        Content::Object { object } => json!({"type": "text", "text": object.to_string()}),
        Content::Document { document } => document_part(document)?,
    })
}

fn document_part(document: &Document) -> Result<Value> {
    let content_type = document
        .metadata
        .content_type
        .as_deref()
        .unwrap_or("application/octet-stream");

    let Some(bytes) = document.bytes()? else {
        let name = document.metadata.file_name.as_deref().unwrap_or(&document.id);
        return Ok(json!({"type": "text", "text": format!("[document {name} ({content_type})]")}));
    };

    if content_type.starts_with("image/") {
        let data = document.data.as_deref().unwrap_or_default();
        return Ok(json!({
            "type": "image_url",
            "image_url": {"url": format!("data:{content_type};base64,{data}")}
        }));
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(json!({"type": "text", "text": text})),
        Err(_) => Err(AgentError::InvalidArgument(format!(
            "Unsupported document content type '{content_type}' for document '{}'",
            document.id
        ))),
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MessageWindowRuntimeMemory;
    use crate::request::{AgentRequest, ResponseConfiguration};
    use crate::types::AgentMetrics;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> OpenAiChatAdapter {
        OpenAiChatAdapter::new("test-key", "gpt-test", Some(format!("{}/", server.uri()))).unwrap()
    }

    fn memory_with(messages: Vec<Message>) -> MessageWindowRuntimeMemory {
        let mut memory = MessageWindowRuntimeMemory::new(20);
        memory.add_messages(messages);
        memory
    }

    #[test]
    fn rejects_blank_api_key() {
        assert!(OpenAiChatAdapter::new(" ", DEFAULT_MODEL, None).is_err());
    }

    #[tokio::test]
    async fn text_reply_increments_metrics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "messages": [
                    {"role": "system", "content": "Be brief"},
                    {"role": "user", "content": "hi"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let context = AgentContext::empty().with_metrics(AgentMetrics::new(2, TokenUsage::new(10, 10)));
        let response = adapter(&server)
            .execute_chat_request(
                &AgentExecutionContext::default(),
                context,
                &memory_with(vec![Message::system("Be brief"), Message::user("hi")]),
            )
            .await
            .unwrap();

        assert_eq!(response.assistant_message.text(), Some("Hello!"));
        assert_eq!(
            response.agent_context.metrics,
            AgentMetrics::new(3, TokenUsage::new(22, 13))
        );
    }

    #[tokio::test]
    async fn sends_tools_and_maps_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "tools": [{"type": "function", "function": {"name": "getWeather"}}],
                "messages": [
                    {"role": "user", "content": "weather?"},
                    {"role": "assistant", "content": null, "tool_calls": [{"id": "call_0", "type": "function"}]},
                    {"role": "tool", "tool_call_id": "call_0", "content": "sunny"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "getWeather", "arguments": "{\"city\":\"Berlin\"}"}
                    }]
                }}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let context = AgentContext::empty().with_tool_definitions(vec![ToolDefinition::new(
            "getWeather",
            "Current weather",
            json!({"type": "object", "properties": {"city": {"type": "string"}}}),
        )]);
        let previous_call = ToolCall::new("call_0", "getWeather", Map::new());
        let memory = memory_with(vec![
            Message::user("weather?"),
            Message::Assistant(AssistantMessage {
                tool_calls: vec![previous_call],
                ..Default::default()
            }),
            Message::tool_call_results(vec![ToolCallResult::new("call_0", "getWeather", "sunny")]),
        ]);

        let response = adapter(&server)
            .execute_chat_request(&AgentExecutionContext::default(), context, &memory)
            .await
            .unwrap();

        let calls = &response.assistant_message.tool_calls;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "getWeather");
        assert_eq!(calls[0].arguments["city"], "Berlin");
        assert!(response.assistant_message.content.is_empty());
        assert_eq!(response.agent_context.metrics.model_calls, 1);
    }

    #[tokio::test]
    async fn json_format_requests_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "response_format": {"type": "json_schema", "json_schema": {"name": "Answer"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "{\"a\":1}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let execution = AgentExecutionContext::new(AgentRequest {
            response: Some(ResponseConfiguration {
                format: ResponseFormatConfiguration::Json {
                    schema: Some(json!({"type": "object"})),
                    schema_name: Some("Answer".into()),
                },
                include_assistant_message: false,
            }),
            ..Default::default()
        });

        let response = adapter(&server)
            .execute_chat_request(&execution, AgentContext::empty(), &memory_with(vec![Message::user("a?")]))
            .await
            .unwrap();
        assert_eq!(response.assistant_message.text(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn error_status_surfaces_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(json!({"error": {"message": "Rate limit reached"}})),
            )
            .mount(&server)
            .await;

        let err = adapter(&server)
            .execute_chat_request(
                &AgentExecutionContext::default(),
                AgentContext::empty(),
                &memory_with(vec![Message::user("hi")]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Api { status: 429, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn inline_text_documents_become_text_parts() {
        let document = Document::inline("doc-1", "text/plain", b"invoice total: 42");
        assert_eq!(
            document_part(&document).unwrap(),
            json!({"type": "text", "text": "invoice total: 42"})
        );

        let image = Document::inline("img-1", "image/png", &[0x89, 0x50]);
        assert!(document_part(&image).unwrap()["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }
}
