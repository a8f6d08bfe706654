//! Tool definitions offered to the model.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named tool schema. Names are unique within a context's tool list.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(default = serde_json::json!({"type": "object"}))]
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

fn empty_object_schema() -> Value {
    serde_json::json!({"type": "object"})
}
