//! Message types exchanged with the model and kept in conversation memory.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::document::Document;

/// Metadata key carrying the creation time of a message.
pub const METADATA_TIMESTAMP: &str = "timestamp";

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System(SystemMessage),
    User(UserMessage),
    Assistant(AssistantMessage),
    ToolCallResult(ToolCallResultMessage),
}

impl Message {
    /// Create a system message from plain text.
    pub fn system(text: impl Into<String>) -> Self {
        Self::System(SystemMessage {
            content: vec![Content::text(text)],
            metadata: Map::new(),
        })
    }

    /// Create a user message from plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self::User(UserMessage {
            name: None,
            content: vec![Content::text(text)],
            metadata: Map::new(),
        })
    }

    /// Create an assistant message from plain text.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::Assistant(AssistantMessage {
            content: vec![Content::text(text)],
            tool_calls: Vec::new(),
            metadata: Map::new(),
        })
    }

    /// Create a tool call result message.
    pub fn tool_call_results(results: Vec<ToolCallResult>) -> Self {
        Self::ToolCallResult(ToolCallResultMessage {
            results,
            metadata: Map::new(),
        })
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Self::System(_))
    }

    /// Content blocks of this message. Tool call result messages have none.
    pub fn content(&self) -> &[Content] {
        match self {
            Self::System(m) => &m.content,
            Self::User(m) => &m.content,
            Self::Assistant(m) => &m.content,
            Self::ToolCallResult(_) => &[],
        }
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        match self {
            Self::System(m) => &m.metadata,
            Self::User(m) => &m.metadata,
            Self::Assistant(m) => &m.metadata,
            Self::ToolCallResult(m) => &m.metadata,
        }
    }

    /// Tool calls requested by this message (assistant messages only).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant(m) => &m.tool_calls,
            _ => &[],
        }
    }

    /// First non-blank text block, if any.
    pub fn text(&self) -> Option<&str> {
        first_text(self.content())
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Self::Assistant(m) => Some(m),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SystemMessage {
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl UserMessage {
    /// Build a user message stamped with the current time.
    pub fn timestamped(content: Vec<Content>) -> Self {
        let mut metadata = Map::new();
        metadata.insert(
            METADATA_TIMESTAMP.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        Self {
            name: None,
            content,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AssistantMessage {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// First non-blank text block, if any.
    pub fn text(&self) -> Option<&str> {
        first_text(&self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolCallResultMessage {
    pub results: Vec<ToolCallResult>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

/// A single block of message content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text { text: String },
    Document { document: Document },
    Object { object: Value },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn document(document: Document) -> Self {
        Self::Document { document }
    }

    pub fn object(object: Value) -> Self {
        Self::Object { object }
    }
}

fn first_text(content: &[Content]) -> Option<&str> {
    content.iter().find_map(|block| match block {
        Content::Text { text } if !text.trim().is_empty() => Some(text.as_str()),
        _ => None,
    })
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// The result of executing a tool call, as handed back by the caller.
///
/// A result without an `id` is an event: out-of-band input that did not answer
/// any particular tool call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolCallResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
}

impl ToolCallResult {
    /// Property set on results synthesized for interrupted tool calls.
    pub const PROPERTY_INTERRUPTED: &'static str = "interrupted";
    /// Content of results synthesized for interrupted tool calls.
    pub const CONTENT_CANCELLED: &'static str = "CANCELLED";

    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<Value>) -> Self {
        Self {
            id: Some(id.into()),
            name: Some(name.into()),
            content: content.into(),
            properties: Map::new(),
        }
    }

    /// An event carrying `content`, not bound to a tool call.
    pub fn event(content: impl Into<Value>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// A cancelled result for a tool call that was interrupted by an event.
    pub fn interrupted(call: &ToolCall) -> Self {
        Self::new(call.id.clone(), call.name.clone(), Self::CONTENT_CANCELLED)
            .with_property(Self::PROPERTY_INTERRUPTED, true)
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Whether this result is an event rather than an answer to a tool call.
    pub fn is_event(&self) -> bool {
        self.id.as_deref().map_or(true, |id| id.trim().is_empty())
    }

    pub fn is_interrupted(&self) -> bool {
        self.properties
            .get(Self::PROPERTY_INTERRUPTED)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_serializes_with_role_tag() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"][0]["type"], "text");
        assert_eq!(value["content"][0]["text"], "hi");
    }

    #[test]
    fn assistant_message_round_trips_tool_calls() {
        let raw = json!({
            "role": "assistant",
            "content": [],
            "toolCalls": [{"id": "call_1", "name": "lookup", "arguments": {"q": "rust"}}]
        });
        let message: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(message.tool_calls().len(), 1);
        assert_eq!(message.tool_calls()[0].arguments["q"], "rust");
    }

    #[test]
    fn text_skips_blank_blocks() {
        let message = Message::Assistant(AssistantMessage {
            content: vec![
                Content::text("   "),
                Content::object(json!({"a": 1})),
                Content::text("answer"),
            ],
            ..Default::default()
        });
        assert_eq!(message.text(), Some("answer"));
    }

    #[test]
    fn results_without_id_are_events() {
        assert!(ToolCallResult::event("ping").is_event());
        assert!(!ToolCallResult::new("1", "tool", "ok").is_event());
    }

    #[test]
    fn interrupted_result_is_flagged() {
        let call = ToolCall::new("c1", "search", Map::new());
        let result = ToolCallResult::interrupted(&call);
        assert_eq!(result.content, json!("CANCELLED"));
        assert!(result.is_interrupted());
    }
}
